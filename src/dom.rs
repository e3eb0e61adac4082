//! DOMクエリインターフェース
//!
//! クローラと実ブラウザの間の差し替え点。「現在のページ」に束縛されたクエリ
//! 操作だけを公開する。要素の不在は型付きの正常系 (`Ok(None)`) であり、
//! 例外的制御フローには乗せない。
//!
//! 本番実装は chromiumoxide の [`Page`] を包む [`PageDom`]。テストでは
//! `mock` モジュールのインメモリ実装を使う。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::{Element, Page};
use tokio::time::sleep;
use tracing::debug;

use crate::error::ScraperError;

/// `wait_for` のポーリング間隔
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// ページ内の単一ノード
#[async_trait]
pub trait DomNode: Send + Sync + Sized {
    /// ノードのテキスト内容（前後の空白は除去済み）
    async fn text(&self) -> Result<String, ScraperError>;

    /// 属性値の参照
    async fn attribute(&self, name: &str) -> Result<Option<String>, ScraperError>;

    /// このノードを起点とした絞り込みクエリ（0or1件）
    async fn locate(&self, selector: &str) -> Result<Option<Self>, ScraperError>;

    /// このノードを起点とした絞り込みクエリ（0件以上、ページ順）
    async fn locate_all(&self, selector: &str) -> Result<Vec<Self>, ScraperError>;

    /// ノードをクリックして遷移等を発火させる
    async fn click(&self) -> Result<(), ScraperError>;
}

/// 「現在のページ」に対するクエリインターフェース
#[async_trait]
pub trait DomQuery: Send + Sync {
    type Node: DomNode;

    async fn locate(&self, selector: &str) -> Result<Option<Self::Node>, ScraperError>;

    async fn locate_all(&self, selector: &str) -> Result<Vec<Self::Node>, ScraperError>;

    /// 出現を上限時間まで待つ。タイムアウトは呼び出しごとに固定で、
    /// エスカレーションはしない。期限切れは `Ok(None)`。
    async fn wait_for(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Option<Self::Node>, ScraperError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(node) = self.locate(selector).await? {
                return Ok(Some(node));
            }
            if tokio::time::Instant::now() >= deadline {
                debug!("wait_for expired: {}", selector);
                return Ok(None);
            }
            sleep(WAIT_POLL_INTERVAL).await;
        }
    }

    async fn navigate(&self, url: &str) -> Result<(), ScraperError>;

    async fn current_url(&self) -> Result<String, ScraperError>;
}

/// 候補パスを順に試し、最初に見つかったノードのテキストを返す
/// （序数パスの位置フォールバック）
pub(crate) async fn first_text<N: DomNode>(anchor: &N, paths: &[&str]) -> Option<String> {
    for path in paths {
        if let Ok(Some(node)) = anchor.locate(path).await {
            if let Ok(text) = node.text().await {
                return Some(text);
            }
        }
    }
    None
}

/// chromiumoxide ページを包む本番実装
#[derive(Clone)]
pub struct PageDom {
    page: Arc<Page>,
}

impl PageDom {
    pub fn new(page: Arc<Page>) -> Self {
        Self { page }
    }
}

/// chromiumoxide 要素ハンドル
pub struct PageNode {
    element: Element,
}

#[async_trait]
impl DomNode for PageNode {
    async fn text(&self) -> Result<String, ScraperError> {
        let text = self
            .element
            .inner_text()
            .await
            .map_err(|e| ScraperError::Dom(format!("inner_text: {}", e)))?;
        Ok(text.unwrap_or_default().trim().to_string())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>, ScraperError> {
        self.element
            .attribute(name)
            .await
            .map_err(|e| ScraperError::Dom(format!("attribute {}: {}", name, e)))
    }

    async fn locate(&self, selector: &str) -> Result<Option<Self>, ScraperError> {
        // 不一致はCDPエラーとして返るため、正常系のOk(None)に写す
        match self.element.find_element(selector).await {
            Ok(element) => Ok(Some(Self { element })),
            Err(e) => {
                debug!("sub-locate miss '{}': {}", selector, e);
                Ok(None)
            }
        }
    }

    async fn locate_all(&self, selector: &str) -> Result<Vec<Self>, ScraperError> {
        match self.element.find_elements(selector).await {
            Ok(elements) => Ok(elements
                .into_iter()
                .map(|element| Self { element })
                .collect()),
            Err(e) => {
                debug!("sub-locate-all miss '{}': {}", selector, e);
                Ok(Vec::new())
            }
        }
    }

    async fn click(&self) -> Result<(), ScraperError> {
        self.element
            .click()
            .await
            .map_err(|e| ScraperError::Dom(format!("click: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl DomQuery for PageDom {
    type Node = PageNode;

    async fn locate(&self, selector: &str) -> Result<Option<Self::Node>, ScraperError> {
        match self.page.find_element(selector).await {
            Ok(element) => Ok(Some(PageNode { element })),
            Err(e) => {
                debug!("locate miss '{}': {}", selector, e);
                Ok(None)
            }
        }
    }

    async fn locate_all(&self, selector: &str) -> Result<Vec<Self::Node>, ScraperError> {
        match self.page.find_elements(selector).await {
            Ok(elements) => Ok(elements
                .into_iter()
                .map(|element| PageNode { element })
                .collect()),
            Err(e) => {
                debug!("locate-all miss '{}': {}", selector, e);
                Ok(Vec::new())
            }
        }
    }

    async fn navigate(&self, url: &str) -> Result<(), ScraperError> {
        self.page
            .goto(url)
            .await
            .map_err(|e| ScraperError::Navigation(e.to_string()))?;
        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| ScraperError::Navigation(e.to_string()))?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, ScraperError> {
        self.page
            .url()
            .await
            .map_err(|e| ScraperError::Navigation(e.to_string()))?
            .ok_or_else(|| ScraperError::Navigation("現在のURLを取得できません".into()))
    }
}

/// テスト用のインメモリDOM
///
/// セレクタ文字列を完全一致キーとして使う。`click_target` を持つノードを
/// クリックすると該当URLのページへ遷移する（「前のシーズン」ボタンの模擬）。
#[cfg(test)]
pub(crate) mod mock {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::{DomNode, DomQuery};
    use crate::error::ScraperError;

    #[derive(Debug, Clone, Default)]
    pub struct NodeSpec {
        pub text: String,
        pub attrs: Vec<(String, String)>,
        pub children: Vec<(String, Vec<NodeSpec>)>,
        pub click_target: Option<String>,
    }

    impl NodeSpec {
        pub fn text(text: &str) -> Self {
            Self {
                text: text.to_string(),
                ..Default::default()
            }
        }

        pub fn with_attr(mut self, name: &str, value: &str) -> Self {
            self.attrs.push((name.to_string(), value.to_string()));
            self
        }

        pub fn with_child(self, selector: &str, node: NodeSpec) -> Self {
            self.with_children(selector, vec![node])
        }

        pub fn with_children(mut self, selector: &str, nodes: Vec<NodeSpec>) -> Self {
            if let Some(entry) = self.children.iter_mut().find(|(s, _)| s == selector) {
                entry.1.extend(nodes);
            } else {
                self.children.push((selector.to_string(), nodes));
            }
            self
        }

        pub fn with_click_target(mut self, url: &str) -> Self {
            self.click_target = Some(url.to_string());
            self
        }

        fn find(&self, selector: &str) -> Vec<NodeSpec> {
            self.children
                .iter()
                .find(|(s, _)| s == selector)
                .map(|(_, nodes)| nodes.clone())
                .unwrap_or_default()
        }
    }

    #[derive(Debug, Clone, Default)]
    pub struct PageSpec {
        pub url: String,
        pub nodes: Vec<(String, Vec<NodeSpec>)>,
    }

    impl PageSpec {
        pub fn new(url: &str) -> Self {
            Self {
                url: url.to_string(),
                nodes: Vec::new(),
            }
        }

        pub fn with_node(self, selector: &str, node: NodeSpec) -> Self {
            self.with_nodes(selector, vec![node])
        }

        pub fn with_nodes(mut self, selector: &str, nodes: Vec<NodeSpec>) -> Self {
            if let Some(entry) = self.nodes.iter_mut().find(|(s, _)| s == selector) {
                entry.1.extend(nodes);
            } else {
                self.nodes.push((selector.to_string(), nodes));
            }
            self
        }

        fn find(&self, selector: &str) -> Vec<NodeSpec> {
            self.nodes
                .iter()
                .find(|(s, _)| s == selector)
                .map(|(_, nodes)| nodes.clone())
                .unwrap_or_default()
        }
    }

    #[derive(Debug)]
    struct State {
        pages: Vec<PageSpec>,
        current: usize,
        visited: Vec<String>,
    }

    #[derive(Debug, Clone)]
    pub struct MockDom {
        state: Arc<Mutex<State>>,
    }

    impl MockDom {
        pub fn new(pages: Vec<PageSpec>) -> Self {
            assert!(!pages.is_empty(), "mock dom needs at least one page");
            Self {
                state: Arc::new(Mutex::new(State {
                    pages,
                    current: 0,
                    visited: Vec::new(),
                })),
            }
        }

        pub fn visited(&self) -> Vec<String> {
            self.state.lock().unwrap().visited.clone()
        }

        fn goto(&self, url: &str) -> Result<(), ScraperError> {
            let mut state = self.state.lock().unwrap();
            let index = state
                .pages
                .iter()
                .position(|p| p.url == url)
                .ok_or_else(|| ScraperError::Navigation(format!("unknown url: {}", url)))?;
            state.current = index;
            state.visited.push(url.to_string());
            Ok(())
        }

        fn current_page(&self) -> PageSpec {
            let state = self.state.lock().unwrap();
            state.pages[state.current].clone()
        }
    }

    #[derive(Debug, Clone)]
    pub struct MockNode {
        spec: NodeSpec,
        dom: MockDom,
    }

    #[async_trait]
    impl DomNode for MockNode {
        async fn text(&self) -> Result<String, ScraperError> {
            Ok(self.spec.text.trim().to_string())
        }

        async fn attribute(&self, name: &str) -> Result<Option<String>, ScraperError> {
            Ok(self
                .spec
                .attrs
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone()))
        }

        async fn locate(&self, selector: &str) -> Result<Option<Self>, ScraperError> {
            Ok(self.spec.find(selector).into_iter().next().map(|spec| Self {
                spec,
                dom: self.dom.clone(),
            }))
        }

        async fn locate_all(&self, selector: &str) -> Result<Vec<Self>, ScraperError> {
            Ok(self
                .spec
                .find(selector)
                .into_iter()
                .map(|spec| Self {
                    spec,
                    dom: self.dom.clone(),
                })
                .collect())
        }

        async fn click(&self) -> Result<(), ScraperError> {
            if let Some(url) = &self.spec.click_target {
                self.dom.goto(url)?;
            }
            Ok(())
        }
    }

    #[async_trait]
    impl DomQuery for MockDom {
        type Node = MockNode;

        async fn locate(&self, selector: &str) -> Result<Option<Self::Node>, ScraperError> {
            Ok(self
                .current_page()
                .find(selector)
                .into_iter()
                .next()
                .map(|spec| MockNode {
                    spec,
                    dom: self.clone(),
                }))
        }

        async fn locate_all(&self, selector: &str) -> Result<Vec<Self::Node>, ScraperError> {
            Ok(self
                .current_page()
                .find(selector)
                .into_iter()
                .map(|spec| MockNode {
                    spec,
                    dom: self.clone(),
                })
                .collect())
        }

        // モックでは即時判定（ポーリング不要）
        async fn wait_for(
            &self,
            selector: &str,
            _timeout: Duration,
        ) -> Result<Option<Self::Node>, ScraperError> {
            self.locate(selector).await
        }

        async fn navigate(&self, url: &str) -> Result<(), ScraperError> {
            self.goto(url)
        }

        async fn current_url(&self) -> Result<String, ScraperError> {
            Ok(self.current_page().url)
        }
    }
}
