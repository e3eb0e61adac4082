use fbref_scraper::{CrawlRequest, ScraperService};
use tower::Service;

#[tokio::main]
async fn main() {
    // ログ設定
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let seasons: usize = std::env::var("FBREF_SEASONS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(2);

    let mut service = ScraperService::new();
    let request = CrawlRequest::players(seasons)
        .with_debug(std::env::var("FBREF_DEBUG").is_ok());

    println!("=== Player Stats Crawl ===");

    match service.call(request).await {
        Ok(result) => {
            println!(
                "成功! CSV保存先: {:?}, レコード: {}",
                result.csv_path, result.summary.records_written
            );
        }
        Err(e) => {
            eprintln!("エラー: {}", e);
        }
    }
}
