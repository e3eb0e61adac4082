//! 試合レポートの列挙と抽出
//!
//! 1シーズンの日程テーブルから試合レポートURLを列挙し、各レポートページの
//! scorebox / チーム統計テーブル / 追加統計領域から1レコードを組み立てる。

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::dom::{first_text, DomNode, DomQuery};
use crate::error::ScraperError;
use crate::record::{normalize_label, Record};
use crate::traits::{EntityRef, SeasonScraper};

use super::locators::{LayoutVersion, MatchLocators, NON_ENTITY_MARKER};

/// 日程テーブルは大きく描画が遅いため、他のアンカーより長めに待つ
const FIXTURES_WAIT: Duration = Duration::from_secs(5);

pub struct MatchScraper {
    locators: &'static MatchLocators,
    wait_timeout: Duration,
}

impl MatchScraper {
    pub fn new(wait_timeout: Duration) -> Self {
        Self {
            locators: MatchLocators::for_version(LayoutVersion::default()),
            wait_timeout,
        }
    }

    pub fn with_layout(wait_timeout: Duration, version: LayoutVersion) -> Self {
        Self {
            locators: MatchLocators::for_version(version),
            wait_timeout,
        }
    }

    /// アンカー起点の必須フィールド。候補パスをすべて外したら
    /// エンティティ全体の失敗。
    async fn required<N: DomNode>(
        anchor: &N,
        paths: &[&str],
        field: &str,
    ) -> Result<String, ScraperError> {
        first_text(anchor, paths)
            .await
            .ok_or_else(|| ScraperError::Extraction(format!("required field '{}' not found", field)))
    }

    /// 追加統計領域を(side1値, ラベル, side2値)の3つ組として歩く。
    /// ラベル枠がチーム名エコーの3つ組は何も記録せず読み飛ばす。
    /// 不完全な3つ組が現れたら残りのグループは断念する（取得済みは保持）。
    async fn extract_extra_stats<N: DomNode>(
        &self,
        extra: &N,
        team1: &str,
        team2: &str,
        record: &mut Record,
    ) -> Result<(), ScraperError> {
        let groups = extra.locate_all(self.locators.extra_group).await?;
        let side1 = normalize_label(team1);
        let side2 = normalize_label(team2);

        'groups: for group in &groups {
            let cells = group.locate_all(self.locators.extra_cell).await?;
            let mut texts = Vec::with_capacity(cells.len());
            for cell in &cells {
                texts.push(cell.text().await.unwrap_or_default());
            }

            let mut i = 0;
            while i < texts.len() {
                if i + 2 >= texts.len() {
                    warn!(
                        "Incomplete stat triple at index {} of {}; abandoning remaining groups",
                        i,
                        texts.len()
                    );
                    break 'groups;
                }

                let label = normalize_label(&texts[i + 1]);
                // チーム名エコー行は統計ではない
                if label.is_empty() || label.starts_with('_') || label == side1 || label == side2 {
                    debug!("Skipping side-identity echo triple (label '{}')", label);
                    i += 3;
                    continue;
                }

                record.push(format!("{}_team1", label), texts[i].trim());
                record.push(format!("{}_team2", label), texts[i + 2].trim());
                i += 3;
            }
        }

        Ok(())
    }
}

#[async_trait]
impl<D: DomQuery> SeasonScraper<D> for MatchScraper {
    async fn enumerate(
        &self,
        dom: &D,
        season: Option<&str>,
    ) -> Result<Vec<EntityRef>, ScraperError> {
        let Some(season) = season else {
            warn!("Season identifier unresolved; cannot locate fixtures table");
            return Ok(Vec::new());
        };

        let selector = self.locators.fixtures_table_for(season);
        let table = dom
            .wait_for(&selector, FIXTURES_WAIT)
            .await?
            .ok_or_else(|| ScraperError::ElementNotFound(format!("fixtures table ({})", selector)))?;

        let rows = table.locate_all(self.locators.fixture_row).await?;
        let mut entities = Vec::new();

        for row in &rows {
            // レポートリンクのない行（ヘッダ/プレースホルダ）は黙って飛ばす
            let Ok(Some(link)) = row.locate(self.locators.report_link).await else {
                continue;
            };
            let name = match link.text().await {
                Ok(text) => text,
                Err(_) => continue,
            };
            // Head-to-Head比較リンクは試合レポートではない
            if name.contains(NON_ENTITY_MARKER) {
                continue;
            }
            let Ok(Some(url)) = link.attribute("href").await else {
                continue;
            };
            entities.push(EntityRef::new(name, url));
        }

        info!("Extracted {} match reports for season {}", entities.len(), season);
        Ok(entities)
    }

    async fn extract(
        &self,
        dom: &D,
        season: Option<&str>,
        entity: &EntityRef,
    ) -> Result<Vec<Record>, ScraperError> {
        let loc = self.locators;

        // アンカー領域。どれかが期限内に現れなければエンティティ全体の失敗。
        let scorebox = dom
            .wait_for(loc.scorebox, self.wait_timeout)
            .await?
            .ok_or_else(|| ScraperError::ElementNotFound(format!("scorebox ({})", loc.scorebox)))?;
        let stats_table = dom
            .wait_for(loc.stats_table, self.wait_timeout)
            .await?
            .ok_or_else(|| {
                ScraperError::ElementNotFound(format!("team stats table ({})", loc.stats_table))
            })?;
        let extra_stats = dom
            .wait_for(loc.extra_stats, self.wait_timeout)
            .await?
            .ok_or_else(|| {
                ScraperError::ElementNotFound(format!("extra stats ({})", loc.extra_stats))
            })?;

        let mut record = Record::new();
        record.push("season", season.unwrap_or(""));

        let date_raw = Self::required(&scorebox, loc.date, "date").await?;
        record.push("date", date_raw.split(',').next().unwrap_or("").trim());
        record.push(
            "time",
            Self::required(&scorebox, loc.kickoff_time, "time").await?,
        );

        let team1 = Self::required(&scorebox, loc.team1, "team1").await?;
        let team2 = Self::required(&scorebox, loc.team2, "team2").await?;
        record.push("team1", team1.as_str());
        record.push("team2", team2.as_str());
        record.push(
            "score_team1",
            Self::required(&scorebox, loc.score_team1, "score_team1").await?,
        );
        record.push(
            "score_team2",
            Self::required(&scorebox, loc.score_team2, "score_team2").await?,
        );
        record.push(
            "xg_team1",
            Self::required(&scorebox, loc.xg_team1, "xg_team1").await?,
        );
        record.push(
            "xg_team2",
            Self::required(&scorebox, loc.xg_team2, "xg_team2").await?,
        );
        record.push(
            "officials",
            Self::required(&scorebox, loc.officials, "officials").await?,
        );

        for (field, side1_paths, side2_paths) in loc.headline_stats {
            record.push(
                format!("{}_team1", field),
                Self::required(&stats_table, side1_paths, field).await?,
            );
            record.push(
                format!("{}_team2", field),
                Self::required(&stats_table, side2_paths, field).await?,
            );
        }

        // 追加統計は任意項目。存在するものだけ拾う。
        self.extract_extra_stats(&extra_stats, &team1, &team2, &mut record)
            .await?;

        debug!("Extracted match record for '{}'", entity.name);
        Ok(vec![record])
    }
}
