use async_trait::async_trait;

use crate::dom::DomQuery;
use crate::error::ScraperError;
use crate::navigator::CrawlSummary;
use crate::record::Record;

/// 1エンティティ分の参照（表示名 + 詳細ページURL）
///
/// 列挙パスの中でのみ生きる一時データで、永続化はされない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRef {
    pub name: String,
    pub url: String,
}

impl EntityRef {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// ターゲット固有の列挙・抽出ロジック
///
/// ナビゲータはシーズン一覧ページで `enumerate` を呼び、各エンティティの
/// 詳細ページへ遷移したうえで `extract` を呼ぶ。
#[async_trait]
pub trait SeasonScraper<D: DomQuery>: Send + Sync {
    /// 現在のシーズン一覧ページから訪問対象をページ順に列挙する
    ///
    /// シーズン識別子が未解決の場合は空列を返す（一覧コンテナのidが
    /// シーズンでパラメータ化されているため列挙できない）。
    async fn enumerate(
        &self,
        dom: &D,
        season: Option<&str>,
    ) -> Result<Vec<EntityRef>, ScraperError>;

    /// 詳細ページに位置したDOMからレコードを抽出する
    ///
    /// アンカー領域の欠落はエンティティ全体の失敗（Err）。部分的に埋まった
    /// レコードを返してはならない。
    async fn extract(
        &self,
        dom: &D,
        season: Option<&str>,
        entity: &EntityRef,
    ) -> Result<Vec<Record>, ScraperError>;
}

/// クロール1回分のライフサイクル
#[async_trait]
pub trait Crawler: Send + Sync {
    /// ブラウザ初期化と開始ページへの遷移
    async fn initialize(&mut self) -> Result<(), ScraperError>;

    /// シーズン横断クロールの実行
    async fn crawl(&mut self) -> Result<CrawlSummary, ScraperError>;

    /// リソース解放
    async fn close(&mut self) -> Result<(), ScraperError>;

    /// 一括実行（initialize → crawl → close）
    async fn execute(&mut self) -> Result<CrawlSummary, ScraperError> {
        self.initialize().await?;
        let summary = self.crawl().await?;
        self.close().await?;
        Ok(summary)
    }
}
