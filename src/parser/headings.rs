use serde_json::{Map, Value};

use crate::error::TransformError;

pub const MAX_LEVEL: usize = 6;

/// Index of a heading inside its [`Outline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeadingId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub text: String,
    pub children: Vec<HeadingId>,
}

/// The open heading per level, h1 at index 0.
pub type HeadingChain = [Option<HeadingId>; MAX_LEVEL];

/// Arena owning every heading of one article; `root` is the h1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outline {
    nodes: Vec<Heading>,
    root: HeadingId,
}

impl Outline {
    pub fn root(&self) -> HeadingId {
        self.root
    }

    pub fn get(&self, id: HeadingId) -> &Heading {
        &self.nodes[id.0]
    }

    pub fn text(&self, id: HeadingId) -> &str {
        &self.get(id).text
    }

    pub fn children(&self, id: HeadingId) -> impl Iterator<Item = &Heading> + '_ {
        self.get(id).children.iter().map(|c| self.get(*c))
    }

    /// Nested `{h1_heading, h2_headings: [...]}` map; empty child lists are
    /// omitted.
    pub fn to_value(&self) -> Value {
        self.heading_value(self.root, 1)
    }

    fn heading_value(&self, id: HeadingId, level: usize) -> Value {
        let heading = self.get(id);
        let mut map = Map::new();
        map.insert(format!("h{level}_heading"), Value::String(heading.text.clone()));
        if !heading.children.is_empty() {
            let subs = heading
                .children
                .iter()
                .map(|c| self.heading_value(*c, level + 1))
                .collect();
            map.insert(format!("h{}_headings", level + 1), Value::Array(subs));
        }
        Value::Object(map)
    }
}

/// Builds an [`Outline`] from headings observed in document order.
#[derive(Debug)]
pub struct HeadingTree {
    outline: Outline,
    active: HeadingChain,
}

impl HeadingTree {
    pub fn new(title: &str) -> Self {
        let root = HeadingId(0);
        let mut active = [None; MAX_LEVEL];
        active[0] = Some(root);
        HeadingTree {
            outline: Outline {
                nodes: vec![Heading { text: title.to_string(), children: Vec::new() }],
                root,
            },
            active,
        }
    }

    /// Open a heading at `level` (1..=6), closing every deeper one.
    ///
    /// A level-1 heading replaces the root. Any other level needs an open
    /// parent one level up.
    pub fn observe(&mut self, level: u8, text: &str) -> Result<HeadingId, TransformError> {
        let idx = usize::from(level);
        if !(1..=MAX_LEVEL).contains(&idx) {
            return Err(TransformError::Structural { level, heading: text.to_string() });
        }

        let parent = match idx {
            1 => None,
            _ => Some(self.active[idx - 2].ok_or_else(|| TransformError::Structural {
                level,
                heading: text.to_string(),
            })?),
        };

        let id = HeadingId(self.outline.nodes.len());
        self.outline.nodes.push(Heading { text: text.to_string(), children: Vec::new() });
        match parent {
            Some(p) => self.outline.nodes[p.0].children.push(id),
            None => self.outline.root = id,
        }

        self.active[idx - 1] = Some(id);
        for slot in &mut self.active[idx..] {
            *slot = None;
        }
        Ok(id)
    }

    pub fn snapshot(&self) -> HeadingChain {
        self.active
    }

    pub fn outline(&self) -> &Outline {
        &self.outline
    }

    pub fn finish(self) -> Outline {
        self.outline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(outline: &Outline, chain: &HeadingChain) -> Vec<Option<String>> {
        chain.iter().map(|h| h.map(|id| outline.text(id).to_string())).collect()
    }

    #[test]
    fn nests_and_closes_deeper_levels() {
        let mut tree = HeadingTree::new("Test");
        tree.observe(2, "Leben").unwrap();
        tree.observe(3, "Kindheit").unwrap();
        tree.observe(4, "Schule").unwrap();
        tree.observe(2, "Werk").unwrap();

        let chain = tree.snapshot();
        assert_eq!(
            texts(tree.outline(), &chain),
            vec![Some("Test".into()), Some("Werk".into()), None, None, None, None]
        );

        tree.observe(3, "Romane").unwrap();
        let outline = tree.finish();
        let root: Vec<&str> = outline.children(outline.root()).map(|h| h.text.as_str()).collect();
        assert_eq!(root, ["Leben", "Werk"]);
    }

    #[test]
    fn missing_parent_is_structural_error() {
        let mut tree = HeadingTree::new("Test");
        tree.observe(2, "Leben").unwrap();
        tree.observe(3, "Kindheit").unwrap();
        tree.observe(2, "Werk").unwrap();
        let err = tree.observe(4, "Romane").unwrap_err();
        assert_eq!(err, TransformError::Structural { level: 4, heading: "Romane".into() });
    }

    #[test]
    fn skipping_a_level_fails() {
        let mut tree = HeadingTree::new("Test");
        assert!(tree.observe(3, "Zu tief").is_err());
    }

    #[test]
    fn level_one_replaces_root() {
        let mut tree = HeadingTree::new("Alt");
        tree.observe(2, "A").unwrap();
        tree.observe(1, "Neu").unwrap();
        let chain = tree.snapshot();
        assert!(chain[1].is_none());
        assert_eq!(tree.outline().text(tree.outline().root()), "Neu");
    }

    #[test]
    fn invalid_level_rejected() {
        let mut tree = HeadingTree::new("Test");
        assert!(tree.observe(0, "x").is_err());
        assert!(tree.observe(7, "x").is_err());
    }

    #[test]
    fn deeper_levels_always_cleared() {
        let sequence = [2u8, 3, 4, 5, 6, 3, 4, 2, 3, 2];
        let mut tree = HeadingTree::new("Test");
        for (i, level) in sequence.iter().enumerate() {
            tree.observe(*level, &format!("h{i}")).unwrap();
            let chain = tree.snapshot();
            let idx = usize::from(*level);
            assert!(chain[..idx].iter().all(Option::is_some));
            assert!(chain[idx..].iter().all(Option::is_none));
        }
    }

    #[test]
    fn nested_value() {
        let mut tree = HeadingTree::new("Test");
        tree.observe(2, "Leben").unwrap();
        tree.observe(3, "Kindheit").unwrap();
        tree.observe(2, "Weblinks").unwrap();
        let v = tree.finish().to_value();
        assert_eq!(
            v,
            serde_json::json!({
                "h1_heading": "Test",
                "h2_headings": [
                    { "h2_heading": "Leben", "h3_headings": [ { "h3_heading": "Kindheit" } ] },
                    { "h2_heading": "Weblinks" }
                ]
            })
        );
    }
}
