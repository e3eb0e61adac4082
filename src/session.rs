//! ブラウザセッション
//!
//! 1クロール = 1セッション。呼び出し側（クローラ）が生成して所有し、
//! クロール終了時に解放する。グローバルなドライバは持たない。

use std::sync::Arc;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::config::CrawlConfig;
use crate::dom::{DomNode, DomQuery, PageDom};
use crate::error::ScraperError;

/// Cookie同意バナーの拒否/承諾ボタン（レイアウト世代ごとの候補）
const COOKIE_BUTTON_SELECTORS: &[&str] = &[
    "#qc-cmp2-ui > div:nth-of-type(2) > div > button:nth-of-type(2)",
    "#qc-cmp2-ui > div:nth-of-type(2) > div > button:nth-of-type(3)",
];

/// バナー出現の待機上限
const COOKIE_WAIT: Duration = Duration::from_secs(2);

pub struct BrowserSession {
    browser: Browser,
    page: Arc<Page>,
    debug: bool,
}

impl BrowserSession {
    /// ブラウザを起動して開始URLへ遷移する
    pub async fn launch(config: &CrawlConfig) -> Result<Self, ScraperError> {
        info!("Initializing browser session...");

        // ユニークなユーザーデータディレクトリを生成
        let unique_id = format!(
            "{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        );
        let user_data_dir = std::env::temp_dir().join(format!("fbref-scraper-{}", unique_id));

        // Chrome パスを取得
        let chrome_path = std::env::var("CHROME_PATH")
            .or_else(|_| std::env::var("CHROMIUM_PATH"))
            .unwrap_or_else(|_| "chromium".to_string());

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .user_data_dir(&user_data_dir)
            .window_size(1280, 800);

        if !config.headless {
            builder = builder.with_head();
        }

        builder = builder
            .no_sandbox()
            .request_timeout(Duration::from_secs(60))
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu");

        if config.debug {
            builder = builder.arg("--enable-logging=stderr").arg("--v=1");
        }

        let browser_config = builder
            .build()
            .map_err(|e| ScraperError::BrowserInit(e.to_string()))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| ScraperError::BrowserInit(e.to_string()))?;

        // ブラウザイベントハンドラをバックグラウンドで実行
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                debug!("Browser event: {:?}", event);
            }
        });

        let page = browser
            .new_page(config.start_url.as_str())
            .await
            .map_err(|e| ScraperError::BrowserInit(e.to_string()))?;

        page.wait_for_navigation()
            .await
            .map_err(|e| ScraperError::Navigation(e.to_string()))?;

        info!("Browser session ready at {}", config.start_url);
        Ok(Self {
            browser,
            page: Arc::new(page),
            debug: config.debug,
        })
    }

    /// 現在のページに束縛されたDOMクエリインターフェース
    pub fn dom(&self) -> PageDom {
        PageDom::new(self.page.clone())
    }

    /// Cookie同意バナーを閉じる。見つからなくても失敗扱いにはしない。
    pub async fn dismiss_cookie_notice(&self) {
        let dom = self.dom();
        for selector in COOKIE_BUTTON_SELECTORS {
            match dom.wait_for(selector, COOKIE_WAIT).await {
                Ok(Some(button)) => match button.click().await {
                    Ok(()) => {
                        info!("Dismissed cookie notice via '{}'", selector);
                        return;
                    }
                    Err(e) => warn!("Cookie button '{}' not clickable: {}", selector, e),
                },
                Ok(None) => debug!("Cookie button '{}' not present", selector),
                Err(e) => warn!("Cookie button lookup '{}' failed: {}", selector, e),
            }
        }
        debug!("No cookie notice dismissed");

        if self.debug {
            self.debug_screenshot("cookie-notice").await;
        }
    }

    /// デバッグ用スクリーンショットをログに埋め込む
    async fn debug_screenshot(&self, label: &str) {
        match self
            .page
            .screenshot(ScreenshotParams::builder().full_page(true).build())
            .await
        {
            Ok(bytes) => {
                use base64::Engine;
                let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
                debug!("{} screenshot: data:image/png;base64,{}", label, encoded);
            }
            Err(e) => debug!("Screenshot failed ({}): {}", label, e),
        }
    }

    /// セッションを閉じてブラウザプロセスを解放する
    pub async fn close(self) {
        info!("Closing browser session...");
        drop(self.page);
        drop(self.browser);
        info!("Browser session closed");
    }
}
