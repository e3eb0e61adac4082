//! 抽出レコードと累積テーブル
//!
//! 統計値はソースの表示そのまま（生文字列）で保持する。型変換は下流の責務。

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::ScraperError;

/// フィールド名 → 生文字列値の順序付きマッピング
///
/// 挿入順を保持する。同名フィールドの再挿入は値を上書きする。
#[derive(Debug, Clone, Default, Serialize)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(entry) = self.fields.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = value;
        } else {
            self.fields.push((name, value));
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// 統計ラベルを正規化したフィールド名に変換する
///
/// 小文字化し、空白列をアンダースコア1つに畳む。冪等（正規形は不動点）。
pub fn normalize_label(label: &str) -> String {
    label
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// 追記専用の累積テーブル
///
/// カラムスキーマはレコード追加のたびに増分更新され、単調非減少。
/// 後から発見されたフィールドを持たない既存行は、出力時に空セルで埋める。
#[derive(Debug, Default)]
pub struct TableBuilder {
    columns: Vec<String>,
    column_index: HashMap<String, usize>,
    records: Vec<Record>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: Record) {
        for name in record.field_names() {
            if !self.column_index.contains_key(name) {
                self.column_index
                    .insert(name.to_string(), self.columns.len());
                self.columns.push(name.to_string());
            }
        }
        self.records.push(record);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn row_count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 全レコードを統合スキーマに合わせた行として返す（欠損は空文字）
    pub fn rows(&self) -> Vec<Vec<String>> {
        self.records
            .iter()
            .map(|record| {
                self.columns
                    .iter()
                    .map(|col| record.get(col).unwrap_or_default().to_string())
                    .collect()
            })
            .collect()
    }
}

/// 収集済みレコードをタイムスタンプ付きJSONとして保存する（デバッグ用）
pub fn dump_raw_records(records: &[Record], base_path: &Path) -> Result<PathBuf, ScraperError> {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let stem = base_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "records".to_string());
    let dump_path = base_path.with_file_name(format!("{}_{}.json", stem, timestamp));

    let json = serde_json::to_string_pretty(records)
        .map_err(|e| ScraperError::Extraction(format!("record serialization: {}", e)))?;
    std::fs::write(&dump_path, json)?;
    info!("Dumped {} raw records to {:?}", records.len(), dump_path);
    Ok(dump_path)
}

/// ディレクトリが存在しなければ作成する
pub(crate) fn ensure_parent_dir(path: &Path) -> Result<(), ScraperError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!("Failed to create output directory {:?}: {}", parent, e);
                return Err(e.into());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_label() {
        assert_eq!(normalize_label("Passing Accuracy"), "passing_accuracy");
        assert_eq!(normalize_label("  Aerials Won "), "aerials_won");
        assert_eq!(normalize_label("Fouls"), "fouls");
    }

    #[test]
    fn test_normalize_label_idempotent() {
        let once = normalize_label("Shots on Target");
        let twice = normalize_label(&once);
        assert_eq!(once, twice);
        assert_eq!(once, "shots_on_target");
    }

    #[test]
    fn test_record_preserves_insertion_order() {
        let mut record = Record::new();
        record.push("season", "2023-2024");
        record.push("team1", "Arsenal");
        record.push("team2", "Chelsea");

        let names: Vec<&str> = record.field_names().collect();
        assert_eq!(names, vec!["season", "team1", "team2"]);
        assert_eq!(record.get("team1"), Some("Arsenal"));
        assert_eq!(record.get("missing"), None);
    }

    #[test]
    fn test_record_push_overwrites_duplicate() {
        let mut record = Record::new();
        record.push("saves_team1", "3");
        record.push("saves_team1", "4");
        assert_eq!(record.len(), 1);
        assert_eq!(record.get("saves_team1"), Some("4"));
    }

    #[test]
    fn test_schema_union_is_monotonic_and_padded() {
        let mut builder = TableBuilder::new();

        let mut a = Record::new();
        a.push("season", "2023-2024");
        a.push("possession_team1", "55%");
        builder.push(a);

        let mut b = Record::new();
        b.push("season", "2023-2024");
        b.push("offsides_team1", "2");
        builder.push(b);

        // カラムは観測順の和集合
        assert_eq!(
            builder.columns(),
            &["season", "possession_team1", "offsides_team1"]
        );

        // 全行が全カラム分の値（欠損は空）を持つ
        let rows = builder.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["2023-2024", "55%", ""]);
        assert_eq!(rows[1], vec!["2023-2024", "", "2"]);
    }

    #[test]
    fn test_schema_union_never_shrinks() {
        let mut builder = TableBuilder::new();

        let mut wide = Record::new();
        wide.push("season", "s");
        wide.push("fouls_team1", "10");
        builder.push(wide);

        let mut narrow = Record::new();
        narrow.push("season", "s");
        builder.push(narrow);

        assert_eq!(builder.columns().len(), 2);
        assert_eq!(builder.rows()[1], vec!["s", ""]);
    }
}
