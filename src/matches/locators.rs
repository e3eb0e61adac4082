//! 試合レポートページのロケータ表
//!
//! FBrefのマークアップには安定したセマンティックラベルがないため、必須
//! フィールドはアンカー領域からの序数パスで読む。パスはすべてここに集約し、
//! レイアウト世代ごとの表として持つ。フィールドごとに候補パスの列を持ち、
//! 先頭から順に試す（過去に位置が動いた officials は2候補）。

/// 検出されたページ構造の世代
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutVersion {
    /// 2024年時点のマークアップ
    #[default]
    V2024,
}

/// ヘッドライン統計1項目分（フィールド名・side1候補パス・side2候補パス）
pub type HeadlineStat = (
    &'static str,
    &'static [&'static str],
    &'static [&'static str],
);

#[derive(Debug)]
pub struct MatchLocators {
    /// 一覧ページ: 日程テーブル（{season}でパラメータ化）
    pub fixtures_table: &'static str,
    pub fixture_row: &'static str,
    pub report_link: &'static str,

    /// 詳細ページのアンカー領域
    pub scorebox: &'static str,
    pub stats_table: &'static str,
    pub extra_stats: &'static str,

    /// scorebox起点の序数パス
    pub date: &'static [&'static str],
    pub kickoff_time: &'static [&'static str],
    pub team1: &'static [&'static str],
    pub team2: &'static [&'static str],
    pub score_team1: &'static [&'static str],
    pub score_team2: &'static [&'static str],
    pub xg_team1: &'static [&'static str],
    pub xg_team2: &'static [&'static str],
    pub officials: &'static [&'static str],

    /// stats_table起点のヘッドライン統計
    pub headline_stats: &'static [HeadlineStat],

    /// extra_stats起点: サブグループと平坦なリーフ列
    pub extra_group: &'static str,
    pub extra_cell: &'static str,
}

impl MatchLocators {
    pub fn for_version(version: LayoutVersion) -> &'static Self {
        match version {
            LayoutVersion::V2024 => &V2024,
        }
    }

    /// 日程テーブルのセレクタ。コンテナidにシーズン識別子が埋め込まれている
    /// ため、シーズンが未解決だと組み立てられない。
    pub fn fixtures_table_for(&self, season: &str) -> String {
        self.fixtures_table.replace("{season}", season)
    }
}

static V2024: MatchLocators = MatchLocators {
    fixtures_table: "#sched_{season}_9_1 tbody",
    fixture_row: "tr",
    report_link: "td[data-stat=\"match_report\"] a",

    scorebox: "#content > div:nth-of-type(2)",
    stats_table: "#team_stats > table",
    extra_stats: "#team_stats_extra",

    date: &[":scope > div:nth-of-type(3) > div:nth-of-type(1) > strong > a"],
    kickoff_time: &[":scope > div:nth-of-type(3) > div:nth-of-type(1) > span:nth-of-type(1)"],
    team1: &[":scope > div:nth-of-type(1) > div:nth-of-type(1) > strong > a"],
    team2: &[":scope > div:nth-of-type(2) > div:nth-of-type(1) > strong > a"],
    score_team1: &[":scope > div:nth-of-type(1) > div:nth-of-type(2) > div:nth-of-type(1)"],
    score_team2: &[":scope > div:nth-of-type(2) > div:nth-of-type(2) > div:nth-of-type(1)"],
    xg_team1: &[":scope > div:nth-of-type(1) > div:nth-of-type(2) > div:nth-of-type(2)"],
    xg_team2: &[":scope > div:nth-of-type(2) > div:nth-of-type(2) > div:nth-of-type(2)"],
    // officialsは少なくとも1世代で位置が動いたため候補を2つ持つ
    officials: &[
        ":scope > div:nth-of-type(3) > div:nth-of-type(7) > small",
        ":scope > div:nth-of-type(3) > div:nth-of-type(6) > small",
    ],

    headline_stats: &[
        (
            "possession",
            &[":scope > tbody > tr:nth-of-type(3) > td:nth-of-type(1) > div > div:nth-of-type(1) > strong"],
            &[":scope > tbody > tr:nth-of-type(3) > td:nth-of-type(2) > div > div:nth-of-type(1) > strong"],
        ),
        (
            "passing_acc",
            &[":scope > tbody > tr:nth-of-type(5) > td:nth-of-type(1) > div > div:nth-of-type(1) > strong"],
            &[":scope > tbody > tr:nth-of-type(5) > td:nth-of-type(2) > div > div:nth-of-type(1) > strong"],
        ),
        (
            "shots_target",
            &[":scope > tbody > tr:nth-of-type(7) > td:nth-of-type(1) > div > div:nth-of-type(1) > strong"],
            &[":scope > tbody > tr:nth-of-type(7) > td:nth-of-type(2) > div > div:nth-of-type(1) > strong"],
        ),
        (
            "saves",
            &[":scope > tbody > tr:nth-of-type(9) > td:nth-of-type(1) > div > div:nth-of-type(1) > strong"],
            &[":scope > tbody > tr:nth-of-type(9) > td:nth-of-type(2) > div > div:nth-of-type(1) > strong"],
        ),
    ],

    extra_group: ":scope > div",
    extra_cell: "div",
};

/// 試合レポートではない比較リンクの目印。リンクテキストにこれを含む行は
/// エンティティとして扱わない。
pub const NON_ENTITY_MARKER: &str = "Head-to-Head";

/// シーズン見出し（一覧ページ）
pub const SEASON_HEADING: &str = "#meta > div:nth-of-type(2) > h1";

/// 「前のシーズン」コントロール。序数パスが外れたらクラス指定で探す。
pub const PREV_SEASON_SELECTORS: &[&str] = &[
    "#meta > div:nth-of-type(2) > div > a",
    "#meta a.prev",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixtures_table_embeds_season() {
        let locators = MatchLocators::for_version(LayoutVersion::default());
        assert_eq!(
            locators.fixtures_table_for("2023-2024"),
            "#sched_2023-2024_9_1 tbody"
        );
    }

    #[test]
    fn test_officials_has_positional_fallback() {
        let locators = MatchLocators::for_version(LayoutVersion::V2024);
        assert!(locators.officials.len() >= 2);
    }

    #[test]
    fn test_prev_season_candidates_are_distinct() {
        assert!(PREV_SEASON_SELECTORS.len() >= 2);
        assert_ne!(PREV_SEASON_SELECTORS[0], PREV_SEASON_SELECTORS[1]);
    }
}
