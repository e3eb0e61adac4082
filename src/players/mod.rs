//! 選手統計ターゲット
//!
//! リーグ順位テーブルからチームを列挙し、各チームページの標準選手統計を
//! 選手1人 = 1レコードで収集する。カラム構成はシーズンごとに揺れるため、
//! バッチシンクのスキーマ統合を前提とする。

mod crawler;
mod extractor;
pub mod locators;

pub use crawler::PlayerCrawler;
pub use extractor::PlayerScraper;
