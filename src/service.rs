use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};

use serde::Serialize;
use tower::Service;
use tracing::info;

use crate::config::{CrawlConfig, SinkMode};
use crate::error::ScraperError;
use crate::matches::MatchCrawler;
use crate::navigator::CrawlSummary;
use crate::players::PlayerCrawler;
use crate::traits::Crawler;

/// Premier League 日程一覧（試合クロールの既定開始点）
pub const DEFAULT_MATCHES_URL: &str =
    "https://fbref.com/en/comps/9/schedule/Premier-League-Scores-and-Fixtures";

/// Premier League 順位表（選手クロールの既定開始点）
pub const DEFAULT_PLAYERS_URL: &str = "https://fbref.com/en/comps/9/Premier-League-Stats";

/// クロール対象の種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlTarget {
    /// 試合レポート（エンティティ = 試合）
    Matches,
    /// 選手統計（エンティティ = チーム）
    Players,
}

/// クロールリクエスト
#[derive(Debug, Clone)]
pub struct CrawlRequest {
    pub target: CrawlTarget,
    pub start_url: String,
    pub seasons: usize,
    pub output_path: PathBuf,
    pub sink_mode: SinkMode,
    pub headless: bool,
    pub debug: bool,
}

impl CrawlRequest {
    /// 試合統計クロール（逐次追記シンク）
    pub fn matches(seasons: usize) -> Self {
        Self {
            target: CrawlTarget::Matches,
            start_url: DEFAULT_MATCHES_URL.to_string(),
            seasons,
            output_path: PathBuf::from(format!(
                "./data/Premier_League_Match_Stats_Last_{}_Seasons.csv",
                seasons
            )),
            sink_mode: SinkMode::PerEntityAppend,
            headless: true,
            debug: false,
        }
    }

    /// 選手統計クロール（シーズンバッチシンク）
    pub fn players(seasons: usize) -> Self {
        Self {
            target: CrawlTarget::Players,
            start_url: DEFAULT_PLAYERS_URL.to_string(),
            seasons,
            output_path: PathBuf::from(format!(
                "./data/Premier_League_Player_Stats_Last_{}_Seasons.csv",
                seasons
            )),
            sink_mode: SinkMode::SeasonBatch,
            headless: true,
            debug: false,
        }
    }

    pub fn with_start_url(mut self, url: impl Into<String>) -> Self {
        self.start_url = url.into();
        self
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    pub fn with_sink_mode(mut self, mode: SinkMode) -> Self {
        self.sink_mode = mode;
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

impl From<CrawlRequest> for CrawlConfig {
    fn from(req: CrawlRequest) -> Self {
        CrawlConfig::new(req.start_url, req.seasons)
            .with_output_path(req.output_path)
            .with_sink_mode(req.sink_mode)
            .with_headless(req.headless)
            .with_debug(req.debug)
    }
}

/// クロール結果
#[derive(Debug, Serialize)]
pub struct CrawlResult {
    pub csv_path: PathBuf,
    pub summary: CrawlSummary,
}

/// tower::Serviceを実装したスクレイパーサービス
#[derive(Debug, Clone, Default)]
pub struct ScraperService {
    // 将来的な拡張用（レートリミット、キャッシュなど）
}

impl ScraperService {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Service<CrawlRequest> for ScraperService {
    type Response = CrawlResult;
    type Error = ScraperError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: CrawlRequest) -> Self::Future {
        info!(
            "Crawl request received: target={:?}, seasons={}",
            req.target, req.seasons
        );

        Box::pin(async move {
            let target = req.target;
            let csv_path = req.output_path.clone();
            let config: CrawlConfig = req.into();

            let summary = match target {
                CrawlTarget::Matches => {
                    let mut crawler = MatchCrawler::new(config);
                    crawler.execute().await?
                }
                CrawlTarget::Players => {
                    let mut crawler = PlayerCrawler::new(config);
                    crawler.execute().await?
                }
            };

            info!(
                "Crawl finished: path={:?}, seasons={}, records={}",
                csv_path, summary.seasons_visited, summary.records_written
            );

            Ok(CrawlResult { csv_path, summary })
        })
    }
}
