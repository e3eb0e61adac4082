//! レコードの永続化
//!
//! 2つの粒度をサポートする:
//! - [`CsvAppendSink`]: エンティティごとの逐次追記。ヘッダは初回書き込みで確定し、
//!   以降に発見されたカラムはファイルには載せない（固定カラム契約、警告ログあり）。
//! - [`SeasonBatchSink`]: シーズン単位でメモリに蓄積し、統合スキーマで
//!   テーブル全体を一時ファイル経由で書き換える。確定済みの行が壊れることはない。

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::ScraperError;
use crate::record::{dump_raw_records, ensure_parent_dir, Record, TableBuilder};

/// 永続化戦略の差し替え点
pub trait RecordSink: Send {
    /// 抽出成功したレコード群を永続化対象に加える
    fn append(&mut self, records: &[Record]) -> Result<(), ScraperError>;

    /// 1シーズン分の処理完了通知（バッチ実装はここでフラッシュする）
    fn season_complete(&mut self) -> Result<(), ScraperError> {
        Ok(())
    }

    /// クロール終了時の最終フラッシュ
    fn finalize(&mut self) -> Result<(), ScraperError>;

    /// これまでに永続化対象としたレコード数
    fn records_written(&self) -> usize;
}

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// CSV1行を書き出す（カンマ区切り、必要なセルのみ引用符で保護）
fn write_row<W: Write>(mut w: W, row: &[String]) -> std::io::Result<()> {
    let mut first = true;
    for cell in row {
        if !first {
            write!(w, ",")?;
        } else {
            first = false;
        }
        if needs_quotes(cell) {
            let escaped = cell.replace('"', "\"\"");
            write!(w, "\"{}\"", escaped)?;
        } else {
            write!(w, "{}", cell)?;
        }
    }
    writeln!(w)
}

/// エンティティごとの逐次追記シンク
///
/// 途中クラッシュしても追記済みの行はそのまま残る。既存行の上書き・削除は行わない。
pub struct CsvAppendSink {
    path: PathBuf,
    /// 初回書き込みで確定するカラム集合
    header: Option<Vec<String>>,
    written: usize,
}

impl CsvAppendSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            header: None,
            written: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_record(&mut self, record: &Record) -> Result<(), ScraperError> {
        if self.header.is_none() {
            ensure_parent_dir(&self.path)?;
            let header: Vec<String> = record.field_names().map(str::to_string).collect();
            // ファイルが未作成の場合のみヘッダ行を書く
            if !self.path.exists() {
                let file = File::create(&self.path)?;
                let mut out = BufWriter::new(file);
                write_row(&mut out, &header)?;
                out.flush()?;
            }
            self.header = Some(header);
        }

        let header = self.header.as_ref().unwrap();

        // ヘッダ確定後に現れたカラムはファイルに反映されない（固定カラム契約）
        for name in record.field_names() {
            if !header.iter().any(|h| h == name) {
                warn!(
                    "Column '{}' discovered after header freeze; dropped from {:?}",
                    name, self.path
                );
            }
        }

        let row: Vec<String> = header
            .iter()
            .map(|col| record.get(col).unwrap_or_default().to_string())
            .collect();

        let file = OpenOptions::new().append(true).open(&self.path)?;
        let mut out = BufWriter::new(file);
        write_row(&mut out, &row)?;
        out.flush()?;
        self.written += 1;
        Ok(())
    }
}

impl RecordSink for CsvAppendSink {
    fn append(&mut self, records: &[Record]) -> Result<(), ScraperError> {
        for record in records {
            self.write_record(record)?;
        }
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), ScraperError> {
        info!("Append sink done: {} rows in {:?}", self.written, self.path);
        Ok(())
    }

    fn records_written(&self) -> usize {
        self.written
    }
}

/// シーズン単位バッチシンク
///
/// フラッシュは一時ファイルに全体を書いてからrenameで置き換えるため、
/// 途中クラッシュしても直前のフラッシュまでは無傷で残る。
pub struct SeasonBatchSink {
    path: PathBuf,
    builder: TableBuilder,
    /// finalize時に生レコードをJSONでも保存する（デバッグ用）
    debug_dump: bool,
}

impl SeasonBatchSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            builder: TableBuilder::new(),
            debug_dump: false,
        }
    }

    pub fn with_debug_dump(mut self, debug_dump: bool) -> Self {
        self.debug_dump = debug_dump;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), ScraperError> {
        if self.builder.is_empty() {
            debug!("Nothing to flush yet for {:?}", self.path);
            return Ok(());
        }

        ensure_parent_dir(&self.path)?;
        let tmp_path = self.path.with_extension("csv.tmp");
        {
            let file = File::create(&tmp_path)?;
            let mut out = BufWriter::new(file);
            write_row(&mut out, self.builder.columns())?;
            for row in self.builder.rows() {
                write_row(&mut out, &row)?;
            }
            out.flush()?;
        }
        std::fs::rename(&tmp_path, &self.path)?;
        info!(
            "Flushed {} rows x {} columns to {:?}",
            self.builder.row_count(),
            self.builder.columns().len(),
            self.path
        );
        Ok(())
    }
}

impl RecordSink for SeasonBatchSink {
    fn append(&mut self, records: &[Record]) -> Result<(), ScraperError> {
        for record in records {
            self.builder.push(record.clone());
        }
        Ok(())
    }

    fn season_complete(&mut self) -> Result<(), ScraperError> {
        self.flush()
    }

    fn finalize(&mut self) -> Result<(), ScraperError> {
        self.flush()?;
        if self.debug_dump && !self.builder.is_empty() {
            dump_raw_records(self.builder.records(), &self.path)?;
        }
        Ok(())
    }

    fn records_written(&self) -> usize {
        self.builder.row_count()
    }
}
