//! チームの列挙と選手統計の抽出
//!
//! チームページの標準統計テーブルはシーズンによってカラム構成が変わるため、
//! フィールド名はヘッダ行のラベルを正規化して動的に決める。欠けたカラムの
//! 扱いは累積テーブル側のスキーマ統合に任せる。

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::dom::{DomNode, DomQuery};
use crate::error::ScraperError;
use crate::record::{normalize_label, Record};
use crate::traits::{EntityRef, SeasonScraper};

use super::locators::PlayerLocators;

pub struct PlayerScraper {
    locators: &'static PlayerLocators,
    wait_timeout: Duration,
}

impl PlayerScraper {
    pub fn new(wait_timeout: Duration) -> Self {
        Self {
            locators: PlayerLocators::current(),
            wait_timeout,
        }
    }
}

#[async_trait]
impl<D: DomQuery> SeasonScraper<D> for PlayerScraper {
    async fn enumerate(
        &self,
        dom: &D,
        season: Option<&str>,
    ) -> Result<Vec<EntityRef>, ScraperError> {
        let Some(season) = season else {
            warn!("Season identifier unresolved; cannot locate league table");
            return Ok(Vec::new());
        };

        let selector = self.locators.league_table_for(season);
        let table = dom
            .wait_for(&selector, self.wait_timeout)
            .await?
            .ok_or_else(|| ScraperError::ElementNotFound(format!("league table ({})", selector)))?;

        let rows = table.locate_all(self.locators.team_row).await?;
        let mut teams = Vec::new();

        for row in &rows {
            let Ok(Some(link)) = row.locate(self.locators.team_link).await else {
                continue;
            };
            let name = match link.text().await {
                Ok(text) if !text.is_empty() => text,
                _ => continue,
            };
            let Ok(Some(url)) = link.attribute("href").await else {
                continue;
            };
            teams.push(EntityRef::new(name, url));
        }

        info!("Found {} teams in league table for season {}", teams.len(), season);
        Ok(teams)
    }

    async fn extract(
        &self,
        dom: &D,
        season: Option<&str>,
        entity: &EntityRef,
    ) -> Result<Vec<Record>, ScraperError> {
        let loc = self.locators;

        let table = dom
            .wait_for(loc.stats_table, self.wait_timeout)
            .await?
            .ok_or_else(|| {
                ScraperError::ElementNotFound(format!("player stats table ({})", loc.stats_table))
            })?;

        // ヘッダ行（2段目）からフィールド名を取る
        let header_row = table
            .locate(loc.header_row)
            .await?
            .ok_or_else(|| ScraperError::ElementNotFound(format!("header row ({})", loc.header_row)))?;
        let header_cells = header_row.locate_all(loc.header_cell).await?;
        let mut headers = Vec::with_capacity(header_cells.len());
        for cell in &header_cells {
            headers.push(normalize_label(&cell.text().await.unwrap_or_default()));
        }
        if headers.is_empty() {
            return Err(ScraperError::Extraction("empty stats header row".into()));
        }

        let rows = table.locate_all(loc.player_row).await?;
        let mut records = Vec::new();

        for row in &rows {
            // 先頭ヘッダは行頭セル(th)、残りはtdに対応する
            let Ok(Some(name_cell)) = row.locate(loc.player_cell).await else {
                continue;
            };
            let player = name_cell.text().await.unwrap_or_default();
            let cells = row.locate_all(loc.stat_cell).await?;
            if player.is_empty() && cells.is_empty() {
                continue; // 区切り行
            }

            let mut values = Vec::with_capacity(cells.len() + 1);
            values.push(player);
            for cell in &cells {
                values.push(cell.text().await.unwrap_or_default());
            }

            let mut record = Record::new();
            record.push("season", season.unwrap_or(""));
            record.push("team", entity.name.as_str());
            for (header, value) in headers.iter().zip(values.iter()) {
                if !header.is_empty() {
                    record.push(header.as_str(), value.trim());
                }
            }

            // season/teamしか埋まらなかった行は捨てる
            if record.len() <= 2 {
                debug!("Discarding empty player row for '{}'", entity.name);
                continue;
            }
            records.push(record);
        }

        if records.is_empty() {
            return Err(ScraperError::Extraction(format!(
                "no player rows extracted for '{}'",
                entity.name
            )));
        }

        info!("{}: {} player record(s) extracted", entity.name, records.len());
        Ok(records)
    }
}
