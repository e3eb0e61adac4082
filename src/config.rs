use std::path::PathBuf;
use std::time::Duration;

/// CSV永続化の粒度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkMode {
    /// 抽出成功ごとに1行追記（ヘッダは初回書き込み時に確定）
    PerEntityAppend,
    /// シーズン単位でメモリに蓄積し、スキーマ統合後にまとめて書き出し
    SeasonBatch,
}

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// 一覧ページ（scores & fixtures / league stats）の開始URL
    pub start_url: String,
    /// 遡るシーズン数
    pub seasons: usize,
    /// 出力CSVパス
    pub output_path: PathBuf,
    pub sink_mode: SinkMode,
    pub headless: bool,
    /// 要素待機のタイムアウト
    pub wait_timeout: Duration,
    /// シーズン間のペーシング（対向サーバへの配慮であり正しさの要件ではない）
    pub pacing: Duration,
    pub debug: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            start_url: String::new(),
            seasons: 4,
            output_path: PathBuf::from("./data/stats.csv"),
            sink_mode: SinkMode::PerEntityAppend,
            headless: true,
            wait_timeout: Duration::from_secs(2),
            pacing: Duration::from_secs(3),
            debug: false,
        }
    }
}

impl CrawlConfig {
    pub fn new(start_url: impl Into<String>, seasons: usize) -> Self {
        Self {
            start_url: start_url.into(),
            seasons,
            ..Default::default()
        }
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

    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = CrawlConfig::new("https://example.com/schedule", 6)
            .with_output_path("/tmp/out.csv")
            .with_sink_mode(SinkMode::SeasonBatch)
            .with_headless(false)
            .with_wait_timeout(Duration::from_secs(5))
            .with_pacing(Duration::from_secs(1));

        assert_eq!(config.start_url, "https://example.com/schedule");
        assert_eq!(config.seasons, 6);
        assert_eq!(config.output_path, PathBuf::from("/tmp/out.csv"));
        assert_eq!(config.sink_mode, SinkMode::SeasonBatch);
        assert!(!config.headless);
        assert_eq!(config.wait_timeout, Duration::from_secs(5));
        assert_eq!(config.pacing, Duration::from_secs(1));
    }

    #[test]
    fn test_config_defaults() {
        let config = CrawlConfig::default();
        assert!(config.headless);
        assert_eq!(config.sink_mode, SinkMode::PerEntityAppend);
        assert_eq!(config.seasons, 4);
    }
}
