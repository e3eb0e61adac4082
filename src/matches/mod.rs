//! 試合レポートターゲット
//!
//! Premier Leagueの日程ページからシーズンを遡り、各試合レポートの
//! チーム統計を1行ずつ収集する。

mod crawler;
mod extractor;
pub mod locators;

pub use crawler::MatchCrawler;
pub use extractor::MatchScraper;
