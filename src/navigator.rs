//! シーズンナビゲータ
//!
//! 「前のシーズン」コントロールを辿りながら過去シーズンを遡るクロールの
//! 状態機械。1エンティティの抽出失敗はそのエンティティのスキップに留め、
//! シーズン遷移の失敗はクロールの正常な早期終了として扱う。致命的なのは
//! 永続化の失敗だけ。

use std::time::Duration;

use serde::Serialize;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::dom::{DomNode, DomQuery};
use crate::error::ScraperError;
use crate::sink::RecordSink;
use crate::traits::SeasonScraper;

/// ナビゲーション関連のセレクタと時間設定
#[derive(Debug, Clone)]
pub struct NavigatorOptions {
    /// 遡るシーズン数の上限
    pub seasons: usize,
    /// シーズン識別子を含む見出し
    pub season_heading: &'static str,
    /// 「前のシーズン」コントロール（先頭から順に試す）
    pub prev_selectors: &'static [&'static str],
    pub wait_timeout: Duration,
    /// シーズン間のペーシング遅延
    pub pacing: Duration,
}

/// クロール1回分の集計
#[derive(Debug, Clone, Default, Serialize)]
pub struct CrawlSummary {
    pub seasons_visited: usize,
    pub entities_visited: usize,
    pub entities_failed: usize,
    pub records_written: usize,
}

/// シーズン横断クロールの駆動役
///
/// DOMインターフェース・ターゲット固有ロジック・シンクはすべて呼び出し側が
/// 所有し、ここでは借用するだけ。
pub struct SeasonNavigator<'a, D, S, K>
where
    D: DomQuery,
    S: SeasonScraper<D>,
    K: RecordSink,
{
    dom: &'a D,
    scraper: &'a S,
    sink: &'a mut K,
    options: NavigatorOptions,
}

impl<'a, D, S, K> SeasonNavigator<'a, D, S, K>
where
    D: DomQuery,
    S: SeasonScraper<D>,
    K: RecordSink,
{
    pub fn new(dom: &'a D, scraper: &'a S, sink: &'a mut K, options: NavigatorOptions) -> Self {
        Self {
            dom,
            scraper,
            sink,
            options,
        }
    }

    /// 最大Nシーズンを処理する。「前のシーズン」コントロールが見つからない
    /// 場合はそこで正常終了する（それ以上の履歴がないシーズンがあるため）。
    pub async fn crawl(&mut self) -> Result<CrawlSummary, ScraperError> {
        let mut summary = CrawlSummary::default();

        for iteration in 0..self.options.seasons {
            // 詳細ページ巡回後に一覧へ戻るためのカーソル
            let cursor = self.dom.current_url().await?;
            let season = self.read_season().await;
            match &season {
                Some(s) => info!(
                    "------ Season {} ({}/{})",
                    s,
                    iteration + 1,
                    self.options.seasons
                ),
                None => warn!(
                    "Season heading not resolved ({}/{}); proceeding best-effort",
                    iteration + 1,
                    self.options.seasons
                ),
            }

            let entities = match self.scraper.enumerate(self.dom, season.as_deref()).await {
                Ok(entities) => entities,
                Err(e) => {
                    // シーズンレベルの失敗: このシーズンは諦めて遷移だけ試す
                    warn!("Entity enumeration failed: {}", e);
                    Vec::new()
                }
            };
            info!("Enumerated {} entities", entities.len());

            for entity in &entities {
                summary.entities_visited += 1;

                if let Err(e) = self.dom.navigate(&entity.url).await {
                    warn!("Navigation to '{}' failed: {}", entity.name, e);
                    summary.entities_failed += 1;
                    continue;
                }

                match self.scraper.extract(self.dom, season.as_deref(), entity).await {
                    Ok(records) if !records.is_empty() => {
                        // 永続化の失敗のみクロール全体を中断させる
                        self.sink.append(&records)?;
                        summary.records_written += records.len();
                        info!("Extracted {} record(s) for '{}'", records.len(), entity.name);
                    }
                    Ok(_) => {
                        warn!("No records extracted for '{}'", entity.name);
                        summary.entities_failed += 1;
                    }
                    Err(e) => {
                        warn!("Extraction failed for '{}': {}", entity.name, e);
                        summary.entities_failed += 1;
                    }
                }
            }

            summary.seasons_visited += 1;
            self.sink.season_complete()?;

            if iteration + 1 == self.options.seasons {
                break;
            }

            // 詳細ページの訪問でブラウザ履歴が変わっているため一覧へ戻す
            if let Err(e) = self.dom.navigate(&cursor).await {
                warn!("Failed to return to season listing: {}", e);
                break;
            }

            if !self.previous_season().await {
                info!(
                    "Previous-season control not available; stopping after {} season(s)",
                    summary.seasons_visited
                );
                break;
            }

            sleep(self.options.pacing).await;
        }

        self.sink.finalize()?;
        info!(
            "Crawl finished: {} seasons, {} records ({} entity failures)",
            summary.seasons_visited, summary.records_written, summary.entities_failed
        );
        Ok(summary)
    }

    /// ページ見出しからシーズン識別子（先頭トークン）を読む。
    /// 解決できなくてもクロールは続行する。
    async fn read_season(&self) -> Option<String> {
        let heading = match self
            .dom
            .wait_for(self.options.season_heading, self.options.wait_timeout)
            .await
        {
            Ok(Some(node)) => node,
            Ok(None) => {
                warn!("Season heading '{}' not found", self.options.season_heading);
                return None;
            }
            Err(e) => {
                warn!("Season heading lookup failed: {}", e);
                return None;
            }
        };

        match heading.text().await {
            Ok(text) => {
                let token = text.split_whitespace().next().unwrap_or("").to_string();
                if token.is_empty() {
                    warn!("Season heading is empty");
                    None
                } else {
                    Some(token)
                }
            }
            Err(e) => {
                warn!("Season heading text unavailable: {}", e);
                None
            }
        }
    }

    /// 「前のシーズン」コントロールを探して押す。候補セレクタを順に試し、
    /// どれも見つからない/押せない場合は false（クロール終了の合図）。
    async fn previous_season(&self) -> bool {
        for selector in self.options.prev_selectors {
            match self.dom.wait_for(selector, self.options.wait_timeout).await {
                Ok(Some(control)) => match control.click().await {
                    Ok(()) => {
                        debug!("Activated previous-season control '{}'", selector);
                        return true;
                    }
                    Err(e) => {
                        warn!("Previous-season control '{}' not clickable: {}", selector, e)
                    }
                },
                Ok(None) => debug!("Previous-season control '{}' not found", selector),
                Err(e) => warn!("Previous-season lookup '{}' failed: {}", selector, e),
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::dom::mock::{MockDom, NodeSpec, PageSpec};
    use crate::record::Record;
    use crate::sink::{RecordSink, SeasonBatchSink};
    use crate::traits::{EntityRef, SeasonScraper};

    const HEADING: &str = "#meta h1";
    const PREV: &[&str] = &["#meta .prev a"];

    fn options(seasons: usize) -> NavigatorOptions {
        NavigatorOptions {
            seasons,
            season_heading: HEADING,
            prev_selectors: PREV,
            wait_timeout: Duration::from_millis(10),
            pacing: Duration::from_millis(1),
        }
    }

    /// 一覧の "a.entity" リンクを列挙し、詳細の "#record" の有無で成否が
    /// 決まる単純化ターゲット
    struct StubScraper;

    #[async_trait]
    impl SeasonScraper<MockDom> for StubScraper {
        async fn enumerate(
            &self,
            dom: &MockDom,
            season: Option<&str>,
        ) -> Result<Vec<EntityRef>, ScraperError> {
            if season.is_none() {
                return Ok(Vec::new());
            }
            let mut refs = Vec::new();
            for link in dom.locate_all("a.entity").await? {
                let name = link.text().await?;
                let Some(url) = link.attribute("href").await? else {
                    continue;
                };
                refs.push(EntityRef::new(name, url));
            }
            Ok(refs)
        }

        async fn extract(
            &self,
            dom: &MockDom,
            season: Option<&str>,
            entity: &EntityRef,
        ) -> Result<Vec<Record>, ScraperError> {
            let Some(node) = dom.locate("#record").await? else {
                return Err(ScraperError::ElementNotFound("#record".into()));
            };
            let mut record = Record::new();
            record.push("season", season.unwrap_or(""));
            record.push("entity", entity.name.clone());
            record.push("value", node.text().await?);
            Ok(vec![record])
        }
    }

    /// 何も書き込まないシンク
    #[derive(Default)]
    struct CountingSink {
        appended: usize,
        finalized: bool,
    }

    impl RecordSink for CountingSink {
        fn append(&mut self, records: &[Record]) -> Result<(), ScraperError> {
            self.appended += records.len();
            Ok(())
        }

        fn finalize(&mut self) -> Result<(), ScraperError> {
            self.finalized = true;
            Ok(())
        }

        fn records_written(&self) -> usize {
            self.appended
        }
    }

    /// 初回のappendから失敗するシンク（ディスク障害の模擬）
    #[derive(Default)]
    struct FailingSink {
        attempts: usize,
    }

    impl RecordSink for FailingSink {
        fn append(&mut self, _records: &[Record]) -> Result<(), ScraperError> {
            self.attempts += 1;
            Err(ScraperError::FileIO(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk full",
            )))
        }

        fn finalize(&mut self) -> Result<(), ScraperError> {
            Ok(())
        }

        fn records_written(&self) -> usize {
            0
        }
    }

    fn listing(url: &str, season: &str, entities: &[(&str, &str)], prev: Option<&str>) -> PageSpec {
        let mut page = PageSpec::new(url).with_node(
            HEADING,
            NodeSpec::text(&format!("{} Premier League Scores & Fixtures", season)),
        );
        for (name, href) in entities {
            page = page.with_node("a.entity", NodeSpec::text(name).with_attr("href", href));
        }
        if let Some(prev_url) = prev {
            page = page.with_node(PREV[0], NodeSpec::text("Previous").with_click_target(prev_url));
        }
        page
    }

    fn detail(url: &str, value: Option<&str>) -> PageSpec {
        let page = PageSpec::new(url);
        match value {
            Some(v) => page.with_node("#record", NodeSpec::text(v)),
            None => page,
        }
    }

    #[tokio::test]
    async fn test_zero_seasons_terminates_immediately() {
        let dom = MockDom::new(vec![listing("https://x/2023", "2023-2024", &[], None)]);
        let mut sink = CountingSink::default();
        let summary = SeasonNavigator::new(&dom, &StubScraper, &mut sink, options(0))
            .crawl()
            .await
            .unwrap();

        assert_eq!(summary.seasons_visited, 0);
        assert!(sink.finalized);
    }

    #[tokio::test]
    async fn test_missing_prev_control_ends_crawl_cleanly() {
        // 前のシーズンコントロールが一切ないページでN=5を要求
        let dom = MockDom::new(vec![listing("https://x/2023", "2023-2024", &[], None)]);
        let mut sink = CountingSink::default();
        let summary = SeasonNavigator::new(&dom, &StubScraper, &mut sink, options(5))
            .crawl()
            .await
            .unwrap();

        assert_eq!(summary.seasons_visited, 1);
        assert!(sink.finalized);
    }

    #[tokio::test]
    async fn test_walks_back_at_most_n_seasons() {
        let pages = vec![
            listing("https://x/2023", "2023-2024", &[], Some("https://x/2022")),
            listing("https://x/2022", "2022-2023", &[], Some("https://x/2021")),
            listing("https://x/2021", "2021-2022", &[], Some("https://x/2020")),
            listing("https://x/2020", "2020-2021", &[], None),
        ];
        let dom = MockDom::new(pages);
        let mut sink = CountingSink::default();
        let summary = SeasonNavigator::new(&dom, &StubScraper, &mut sink, options(2))
            .crawl()
            .await
            .unwrap();

        // 上限2シーズンで停止（ページはまだ残っている）
        assert_eq!(summary.seasons_visited, 2);
    }

    #[tokio::test]
    async fn test_extraction_failure_is_isolated() {
        // 3エンティティ中1つだけ必須アンカーが欠けている
        let pages = vec![
            listing(
                "https://x/2023",
                "2023-2024",
                &[
                    ("Match A", "https://x/match-a"),
                    ("Match B", "https://x/match-b"),
                    ("Match C", "https://x/match-c"),
                ],
                None,
            ),
            detail("https://x/match-a", Some("1-0")),
            detail("https://x/match-b", None),
            detail("https://x/match-c", Some("2-2")),
        ];
        let dom = MockDom::new(pages);
        let mut sink = CountingSink::default();
        let summary = SeasonNavigator::new(&dom, &StubScraper, &mut sink, options(1))
            .crawl()
            .await
            .unwrap();

        assert_eq!(summary.entities_visited, 3);
        assert_eq!(summary.entities_failed, 1);
        assert_eq!(summary.records_written, 2);
        assert_eq!(sink.records_written(), 2);
    }

    #[tokio::test]
    async fn test_persistence_failure_aborts_crawl() {
        // 抽出失敗と違い、永続化の失敗は即座にクロール全体を中断する
        let pages = vec![
            listing(
                "https://x/2023",
                "2023-2024",
                &[
                    ("Match A", "https://x/match-a"),
                    ("Match B", "https://x/match-b"),
                ],
                None,
            ),
            detail("https://x/match-a", Some("1-0")),
            detail("https://x/match-b", Some("2-0")),
        ];
        let dom = MockDom::new(pages);
        let mut sink = FailingSink::default();
        let result = SeasonNavigator::new(&dom, &StubScraper, &mut sink, options(1))
            .crawl()
            .await;

        assert!(matches!(result, Err(ScraperError::FileIO(_))));
        assert_eq!(sink.attempts, 1);
        // 2番目のエンティティには到達しない
        assert_eq!(dom.visited(), vec!["https://x/match-a"]);
    }

    #[tokio::test]
    async fn test_unresolved_season_skips_entities_but_continues() {
        // 見出しのないシーズン → 列挙ゼロ、ただし前のシーズンへは進む
        let headless = PageSpec::new("https://x/unknown").with_node(
            PREV[0],
            NodeSpec::text("Previous").with_click_target("https://x/2022"),
        );
        let pages = vec![
            headless,
            listing(
                "https://x/2022",
                "2022-2023",
                &[("Match A", "https://x/match-a")],
                None,
            ),
            detail("https://x/match-a", Some("0-0")),
        ];
        let dom = MockDom::new(pages);
        let mut sink = CountingSink::default();
        let summary = SeasonNavigator::new(&dom, &StubScraper, &mut sink, options(2))
            .crawl()
            .await
            .unwrap();

        assert_eq!(summary.seasons_visited, 2);
        assert_eq!(summary.records_written, 1);
    }

    #[tokio::test]
    async fn test_returns_to_cursor_before_season_transition() {
        let pages = vec![
            listing(
                "https://x/2023",
                "2023-2024",
                &[("Match A", "https://x/match-a")],
                Some("https://x/2022"),
            ),
            detail("https://x/match-a", Some("3-1")),
            listing("https://x/2022", "2022-2023", &[], None),
        ];
        let dom = MockDom::new(pages);
        let mut sink = CountingSink::default();
        SeasonNavigator::new(&dom, &StubScraper, &mut sink, options(2))
            .crawl()
            .await
            .unwrap();

        // 詳細訪問後、一覧カーソルへ戻ってから遷移している
        let visited = dom.visited();
        assert_eq!(
            visited,
            vec!["https://x/match-a", "https://x/2023", "https://x/2022"]
        );
    }

    #[tokio::test]
    async fn test_batch_sink_receives_season_records() {
        let dir = std::env::temp_dir().join(format!("fbref-nav-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("nav.csv");
        let _ = std::fs::remove_file(&path);

        let pages = vec![
            listing(
                "https://x/2023",
                "2023-2024",
                &[("Match A", "https://x/match-a")],
                None,
            ),
            detail("https://x/match-a", Some("1-1")),
        ];
        let dom = MockDom::new(pages);
        let mut sink = SeasonBatchSink::new(&path);
        SeasonNavigator::new(&dom, &StubScraper, &mut sink, options(1))
            .crawl()
            .await
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines[0], "season,entity,value");
        assert_eq!(lines[1], "2023-2024,Match A,1-1");
    }
}
