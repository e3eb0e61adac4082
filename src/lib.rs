//! FBrefシーズン統計スクレイパーライブラリ
//!
//! - 一覧ページから「前のシーズン」リンクで過去シーズンへ遡る
//! - シーズンごとにエンティティ（試合 / チーム）を列挙して統計を抽出
//! - レコードをCSVへ永続化（逐次追記 or シーズンバッチ）
//!
//! # 試合スクレイパー使用例
//!
//! ```rust,ignore
//! use fbref_scraper::{CrawlConfig, Crawler, MatchCrawler, SinkMode};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = CrawlConfig::new(
//!         "https://fbref.com/en/comps/9/schedule/Premier-League-Scores-and-Fixtures",
//!         4,
//!     )
//!     .with_output_path("./data/matches.csv")
//!     .with_sink_mode(SinkMode::PerEntityAppend);
//!
//!     let mut crawler = MatchCrawler::new(config);
//!     let summary = crawler.execute().await.unwrap();
//!     println!("Records written: {}", summary.records_written);
//! }
//! ```
//!
//! # サービス経由の使用例
//!
//! ```rust,ignore
//! use fbref_scraper::{CrawlRequest, ScraperService};
//! use tower::Service;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut service = ScraperService::new();
//!
//!     let request = CrawlRequest::players(2).with_headless(false);
//!
//!     let result = service.call(request).await.unwrap();
//!     println!("CSV written: {:?}", result.csv_path);
//! }
//! ```

pub mod config;
pub mod dom;
pub mod error;
pub mod matches;
pub mod navigator;
pub mod players;
pub mod record;
pub mod service;
pub mod session;
pub mod sink;
pub mod traits;

// 主要な型をリエクスポート
pub use config::{CrawlConfig, SinkMode};
pub use error::ScraperError;
pub use matches::MatchCrawler;
pub use navigator::{CrawlSummary, NavigatorOptions, SeasonNavigator};
pub use players::PlayerCrawler;
pub use record::{normalize_label, Record, TableBuilder};
pub use service::{CrawlRequest, CrawlResult, CrawlTarget, ScraperService};
pub use session::BrowserSession;
pub use sink::{CsvAppendSink, RecordSink, SeasonBatchSink};
pub use traits::{Crawler, EntityRef, SeasonScraper};

// DOM抽象（テスト用モック実装の差し替え口）もリエクスポート
pub use dom::{DomNode, DomQuery, PageDom};
