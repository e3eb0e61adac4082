use async_trait::async_trait;
use tracing::info;

use crate::config::{CrawlConfig, SinkMode};
use crate::error::ScraperError;
use crate::navigator::{CrawlSummary, NavigatorOptions, SeasonNavigator};
use crate::session::BrowserSession;
use crate::sink::{CsvAppendSink, RecordSink, SeasonBatchSink};
use crate::traits::Crawler;

use super::extractor::PlayerScraper;
use super::locators::{PREV_SEASON_SELECTORS, SEASON_HEADING};

/// 選手統計クローラ
///
/// カラム構成がシーズン間で揺れるため、既定ではシーズンバッチシンク
/// （スキーマ統合あり）で使うことを想定している。
pub struct PlayerCrawler {
    config: CrawlConfig,
    session: Option<BrowserSession>,
}

impl PlayerCrawler {
    pub fn new(config: CrawlConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }

    fn session(&self) -> Result<&BrowserSession, ScraperError> {
        self.session
            .as_ref()
            .ok_or_else(|| ScraperError::BrowserInit("ブラウザが初期化されていません".into()))
    }

    fn navigator_options(&self) -> NavigatorOptions {
        NavigatorOptions {
            seasons: self.config.seasons,
            season_heading: SEASON_HEADING,
            prev_selectors: PREV_SEASON_SELECTORS,
            wait_timeout: self.config.wait_timeout,
            pacing: self.config.pacing,
        }
    }
}

#[async_trait]
impl Crawler for PlayerCrawler {
    async fn initialize(&mut self) -> Result<(), ScraperError> {
        let session = BrowserSession::launch(&self.config).await?;
        session.dismiss_cookie_notice().await;
        self.session = Some(session);
        Ok(())
    }

    async fn crawl(&mut self) -> Result<CrawlSummary, ScraperError> {
        let dom = self.session()?.dom();
        let scraper = PlayerScraper::new(self.config.wait_timeout);
        let options = self.navigator_options();

        info!(
            "Scraping player stats for up to {} season(s) -> {:?}",
            self.config.seasons, self.config.output_path
        );

        let summary = match self.config.sink_mode {
            SinkMode::PerEntityAppend => {
                let mut sink = CsvAppendSink::new(&self.config.output_path);
                let mut navigator = SeasonNavigator::new(&dom, &scraper, &mut sink, options);
                let summary = navigator.crawl().await?;
                info!("Player crawl wrote {} row(s)", sink.records_written());
                summary
            }
            SinkMode::SeasonBatch => {
                let mut sink = SeasonBatchSink::new(&self.config.output_path)
                    .with_debug_dump(self.config.debug);
                let mut navigator = SeasonNavigator::new(&dom, &scraper, &mut sink, options);
                let summary = navigator.crawl().await?;
                info!("Player crawl wrote {} row(s)", sink.records_written());
                summary
            }
        };

        Ok(summary)
    }

    async fn close(&mut self) -> Result<(), ScraperError> {
        if let Some(session) = self.session.take() {
            session.close().await;
        }
        Ok(())
    }
}
