use crate::domain::address_format::PostalCodePattern;
use crate::domain::field::PatternType;
use crate::domain::ports::SubdivisionLoader;
use crate::utils::locale;
use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, ThreadId};

/// Path to a subdivision's parent: the country code followed by the codes
/// leading to the parent, the parent's own code last.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParentRef {
    path: Vec<String>,
}

impl ParentRef {
    /// `path` is `[country_code, code_1, ..]`; it needs at least one code.
    pub fn new(path: Vec<String>) -> Option<Self> {
        if path.len() < 2 {
            return None;
        }
        Some(Self { path })
    }

    pub fn country_code(&self) -> &str {
        &self.path[0]
    }

    pub fn code(&self) -> &str {
        &self.path[self.path.len() - 1]
    }

    /// The parent path under which the parent itself is stored.
    pub fn parents(&self) -> &[String] {
        &self.path[..self.path.len() - 1]
    }

    /// The full path, which is also the parent path of the children.
    pub fn path(&self) -> &[String] {
        &self.path
    }
}

enum ChildrenState {
    NotLoaded,
    /// Held by the thread running the loader.
    Loading(ThreadId),
    Loaded(Arc<[Arc<Subdivision>]>),
}

/// Children of a subdivision, either known upfront or fetched through a
/// [`SubdivisionLoader`] on first access. Concurrent readers wait for the
/// thread that is loading.
pub struct Children {
    lazy: bool,
    state: Mutex<ChildrenState>,
    loaded: Condvar,
}

impl Children {
    pub fn none() -> Self {
        Self::eager(Vec::new())
    }

    pub fn eager(children: Vec<Arc<Subdivision>>) -> Self {
        Self {
            lazy: false,
            state: Mutex::new(ChildrenState::Loaded(children.into())),
            loaded: Condvar::new(),
        }
    }

    pub fn lazy() -> Self {
        Self {
            lazy: true,
            state: Mutex::new(ChildrenState::NotLoaded),
            loaded: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ChildrenState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn is_loaded(&self) -> bool {
        matches!(*self.lock(), ChildrenState::Loaded(_))
    }

    fn has_any(&self) -> bool {
        match &*self.lock() {
            ChildrenState::Loaded(children) => !children.is_empty(),
            ChildrenState::NotLoaded | ChildrenState::Loading(_) => self.lazy,
        }
    }

    fn finish(&self, state: ChildrenState) {
        *self.lock() = state;
        self.loaded.notify_all();
    }
}

/// Puts the state back to `NotLoaded` when the loader panics, so waiting
/// threads do not block forever.
struct LoadGuard<'a> {
    children: &'a Children,
    done: bool,
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.children.finish(ChildrenState::NotLoaded);
        }
    }
}

impl fmt::Debug for Children {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.lock() {
            ChildrenState::NotLoaded => f.write_str("Children(not loaded)"),
            ChildrenState::Loading(_) => f.write_str("Children(loading)"),
            ChildrenState::Loaded(children) => f
                .debug_list()
                .entries(children.iter().map(|c| c.code()))
                .finish(),
        }
    }
}

/// A predefined administrative unit (state, province, city, district).
#[derive(Debug)]
pub struct Subdivision {
    parent: Option<ParentRef>,
    country_code: String,
    code: String,
    local_code: Option<String>,
    name: String,
    local_name: Option<String>,
    iso_code: Option<String>,
    postal_code_pattern: Option<PostalCodePattern>,
    locale: Option<String>,
    children: Children,
}

impl Subdivision {
    pub fn builder(country_code: impl Into<String>, code: impl Into<String>) -> SubdivisionBuilder {
        SubdivisionBuilder::new(country_code.into(), code.into())
    }

    pub fn parent_ref(&self) -> Option<&ParentRef> {
        self.parent.as_ref()
    }

    /// Resolves the parent through the loader; `None` for top-level subdivisions.
    pub fn parent(&self, loader: &dyn SubdivisionLoader) -> Option<Arc<Subdivision>> {
        self.parent.as_ref().and_then(|parent| loader.parent(parent))
    }

    pub fn country_code(&self) -> &str {
        &self.country_code
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn local_code(&self) -> Option<&str> {
        self.local_code.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn local_name(&self) -> Option<&str> {
        self.local_name.as_deref()
    }

    pub fn iso_code(&self) -> Option<&str> {
        self.iso_code.as_deref()
    }

    pub fn postal_code_pattern(&self) -> Option<&PostalCodePattern> {
        self.postal_code_pattern.as_ref()
    }

    pub fn postal_code_pattern_type(&self) -> Option<PatternType> {
        self.postal_code_pattern.as_ref().map(PostalCodePattern::kind)
    }

    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    /// The parent path this subdivision is stored under.
    pub fn parents(&self) -> Vec<String> {
        match &self.parent {
            Some(parent) => parent.path().to_vec(),
            None => vec![self.country_code.clone()],
        }
    }

    /// The parent path of this subdivision's children.
    pub fn children_path(&self) -> Vec<String> {
        let mut path = self.parents();
        path.push(self.code.clone());
        path
    }

    pub fn depth(&self) -> usize {
        self.parents().len()
    }

    /// `true` when children are loaded and non-empty, or flagged for lazy loading.
    pub fn has_children(&self) -> bool {
        self.children.has_any()
    }

    /// Returns the children, materializing them through `loader` the first time.
    ///
    /// The loader runs without holding the state lock (it may ask this
    /// subdivision for `has_children`); other threads block until it is done.
    pub fn children(&self, loader: &dyn SubdivisionLoader) -> Arc<[Arc<Subdivision>]> {
        let current = thread::current().id();
        {
            let mut state = self.children.lock();
            loop {
                let owner = match &*state {
                    ChildrenState::Loaded(children) => return Arc::clone(children),
                    ChildrenState::Loading(owner) => *owner,
                    ChildrenState::NotLoaded => break,
                };
                if owner == current {
                    tracing::warn!("Re-entrant children load for subdivision {}", self.code);
                    return Arc::from(Vec::new());
                }
                state = self
                    .children
                    .loaded
                    .wait(state)
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
            }
            *state = ChildrenState::Loading(current);
        }

        let mut guard = LoadGuard {
            children: &self.children,
            done: false,
        };
        let children: Arc<[Arc<Subdivision>]> = loader.get_all(&self.children_path()).into();
        self.children.finish(ChildrenState::Loaded(Arc::clone(&children)));
        guard.done = true;
        children
    }

    pub fn children_loaded(&self) -> bool {
        self.children.is_loaded()
    }

    pub fn display_code(&self, locale: Option<&str>) -> &str {
        match &self.local_code {
            Some(local_code) if locale::matches_opt(locale, self.locale()) => local_code,
            _ => &self.code,
        }
    }

    pub fn display_name(&self, locale: Option<&str>) -> &str {
        match &self.local_name {
            Some(local_name) if locale::matches_opt(locale, self.locale()) => local_name,
            _ => &self.name,
        }
    }
}

impl PartialEq for Subdivision {
    fn eq(&self, other: &Self) -> bool {
        self.parent == other.parent
            && self.country_code == other.country_code
            && self.code == other.code
            && self.local_code == other.local_code
            && self.name == other.name
            && self.local_name == other.local_name
            && self.iso_code == other.iso_code
            && self.postal_code_pattern == other.postal_code_pattern
            && self.locale == other.locale
    }
}

pub struct SubdivisionBuilder {
    parent: Option<ParentRef>,
    country_code: String,
    code: String,
    local_code: Option<String>,
    name: Option<String>,
    local_name: Option<String>,
    iso_code: Option<String>,
    postal_code_pattern: Option<PostalCodePattern>,
    locale: Option<String>,
    children: Children,
}

impl SubdivisionBuilder {
    fn new(country_code: String, code: String) -> Self {
        Self {
            parent: None,
            country_code,
            code,
            local_code: None,
            name: None,
            local_name: None,
            iso_code: None,
            postal_code_pattern: None,
            locale: None,
            children: Children::none(),
        }
    }

    pub fn parent(mut self, parent: Option<ParentRef>) -> Self {
        self.parent = parent;
        self
    }

    pub fn local_code(mut self, local_code: Option<String>) -> Self {
        self.local_code = local_code;
        self
    }

    pub fn name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    pub fn local_name(mut self, local_name: Option<String>) -> Self {
        self.local_name = local_name;
        self
    }

    pub fn iso_code(mut self, iso_code: Option<String>) -> Self {
        self.iso_code = iso_code;
        self
    }

    pub fn postal_code_pattern(mut self, pattern: Option<PostalCodePattern>) -> Self {
        self.postal_code_pattern = pattern;
        self
    }

    pub fn locale(mut self, locale: Option<String>) -> Self {
        self.locale = locale;
        self
    }

    pub fn children(mut self, children: Children) -> Self {
        self.children = children;
        self
    }

    /// A missing name falls back to the code, a missing local name to the local code.
    pub fn build(self) -> Subdivision {
        let name = self.name.unwrap_or_else(|| self.code.clone());
        let local_name = self.local_name.or_else(|| self.local_code.clone());

        Subdivision {
            parent: self.parent,
            country_code: self.country_code,
            code: self.code,
            local_code: self.local_code,
            name,
            local_name,
            iso_code: self.iso_code,
            postal_code_pattern: self.postal_code_pattern,
            locale: self.locale,
            children: self.children,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct FixedLoader {
        calls: AtomicUsize,
        delay: Duration,
    }

    impl FixedLoader {
        fn new(delay: Duration) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                delay,
            }
        }
    }

    impl SubdivisionLoader for FixedLoader {
        fn get(&self, code: &str, parents: &[String]) -> Option<Arc<Subdivision>> {
            self.get_all(parents).into_iter().find(|s| s.code() == code)
        }

        fn get_all(&self, parents: &[String]) -> Vec<Arc<Subdivision>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            thread::sleep(self.delay);
            let parent = ParentRef::new(parents.to_vec());
            vec![Arc::new(
                Subdivision::builder("CN", "Taichung City")
                    .parent(parent)
                    .build(),
            )]
        }

        fn parent(&self, parent: &ParentRef) -> Option<Arc<Subdivision>> {
            Some(Arc::new(
                Subdivision::builder(parent.country_code(), parent.code()).build(),
            ))
        }
    }

    #[test]
    fn test_builder_defaults() {
        let subdivision = Subdivision::builder("CN", "Taiwan Sheng")
            .local_code(Some("台湾省".to_string()))
            .locale(Some("zh-Hans".to_string()))
            .build();

        assert_eq!(subdivision.name(), "Taiwan Sheng");
        assert_eq!(subdivision.local_name(), Some("台湾省"));
        assert_eq!(subdivision.display_name(Some("zh")), "台湾省");
        assert_eq!(subdivision.display_code(Some("en")), "Taiwan Sheng");
        assert!(!subdivision.has_children());
        assert_eq!(subdivision.parents(), vec!["CN".to_string()]);
    }

    #[test]
    fn test_lazy_children_load_once() {
        let loader = FixedLoader::new(Duration::ZERO);
        let subdivision = Subdivision::builder("CN", "Taiwan Sheng")
            .children(Children::lazy())
            .build();

        assert!(subdivision.has_children());
        assert!(!subdivision.children_loaded());

        let first = subdivision.children(&loader);
        let second = subdivision.children(&loader);
        assert_eq!(first.len(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);

        let child = &first[0];
        assert_eq!(child.children_path(), vec!["CN", "Taiwan Sheng", "Taichung City"]);
        assert_eq!(child.depth(), 2);
        assert_eq!(child.parent(&loader).unwrap().code(), "Taiwan Sheng");
    }

    #[test]
    fn test_concurrent_readers_wait_for_the_load() {
        let loader = FixedLoader::new(Duration::from_millis(200));
        let subdivision = Subdivision::builder("CN", "Taiwan Sheng")
            .children(Children::lazy())
            .build();

        thread::scope(|scope| {
            let first = scope.spawn(|| subdivision.children(&loader).len());
            thread::sleep(Duration::from_millis(50));
            let second = subdivision.children(&loader).len();

            assert_eq!(first.join().unwrap(), 1);
            assert_eq!(second, 1);
        });
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
        assert!(subdivision.children_loaded());
    }

    #[test]
    fn test_parent_ref() {
        assert!(ParentRef::new(vec!["US".to_string()]).is_none());

        let parent = ParentRef::new(vec!["CN".into(), "Taiwan Sheng".into(), "Taichung City".into()]).unwrap();
        assert_eq!(parent.country_code(), "CN");
        assert_eq!(parent.code(), "Taichung City");
        assert_eq!(parent.parents(), &["CN".to_string(), "Taiwan Sheng".to_string()]);
    }
}
