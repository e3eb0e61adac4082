use fbref_scraper::{CrawlConfig, Crawler, MatchCrawler, SinkMode};
use std::path::PathBuf;

#[tokio::main]
async fn main() {
    // ログ設定
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    // 環境変数で遡るシーズン数を指定（既定: 4）
    let seasons: usize = std::env::var("FBREF_SEASONS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(4);
    let headless = std::env::var("FBREF_HEADED").is_err();

    let config = CrawlConfig::new(
        "https://fbref.com/en/comps/9/schedule/Premier-League-Scores-and-Fixtures",
        seasons,
    )
    .with_output_path(PathBuf::from(format!(
        "./data/Premier_League_Match_Stats_Last_{}_Seasons.csv",
        seasons
    )))
    .with_sink_mode(SinkMode::PerEntityAppend)
    .with_headless(headless);

    let mut crawler = MatchCrawler::new(config);

    println!("=== Match Stats Crawl ===");

    match crawler.execute().await {
        Ok(summary) => {
            println!(
                "成功! シーズン: {}, レコード: {}, 失敗エンティティ: {}",
                summary.seasons_visited, summary.records_written, summary.entities_failed
            );
        }
        Err(e) => {
            eprintln!("エラー: {}", e);
        }
    }
}
