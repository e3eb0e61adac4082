//! 選手統計ページのロケータ表
//!
//! 順位テーブル（シーズンidパラメータ付き）からチームを列挙し、
//! 各チームページの標準統計テーブルを読む。テーブルのカラムは
//! 2段目のヘッダ行のラベルから動的に決まる。

#[derive(Debug)]
pub struct PlayerLocators {
    /// 一覧ページ: リーグ順位テーブル（{season}でパラメータ化）
    pub league_table: &'static str,
    pub team_row: &'static str,
    pub team_link: &'static str,

    /// チームページ: 標準選手統計テーブル
    pub stats_table: &'static str,
    pub header_row: &'static str,
    pub header_cell: &'static str,
    pub player_row: &'static str,
    /// 行頭の選手名セル
    pub player_cell: &'static str,
    pub stat_cell: &'static str,
}

impl PlayerLocators {
    pub fn current() -> &'static Self {
        &CURRENT
    }

    pub fn league_table_for(&self, season: &str) -> String {
        self.league_table.replace("{season}", season)
    }
}

static CURRENT: PlayerLocators = PlayerLocators {
    league_table: "#results{season}91_overall tbody",
    team_row: "tr",
    team_link: "td[data-stat=\"team\"] a",

    stats_table: "#stats_standard_9",
    header_row: ":scope > thead > tr:nth-of-type(2)",
    header_cell: "th",
    player_row: ":scope > tbody > tr",
    player_cell: "th",
    stat_cell: "td",
};

/// シーズン見出し（一覧ページ）
pub const SEASON_HEADING: &str = "#meta > div:nth-of-type(2) > h1";

/// 「前のシーズン」コントロール。序数パスが外れたらクラス指定で探す。
pub const PREV_SEASON_SELECTORS: &[&str] = &[
    "#meta > div:nth-of-type(2) > div > a",
    "#meta a.prev",
];
