//! Generic parse tree consumed by the reader.
//!
//! The tree is produced by a parsing front end (the bundled [`crate::parser`], or
//! any other grammar) and carries no evaluation semantics: leaves hold their literal
//! text, groups hold their children in source order including the bracket tokens.

/// Classification of a parse tree node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Number,
    Symbol,
    Group,
    /// Structural token such as a bracket; skipped by the reader
    Punct,
}

/// Bracket style delimiting a group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bracket {
    /// `( )`
    Round,
    /// `{ }`
    Curly,
}

impl Bracket {
    pub fn open(self) -> char {
        match self {
            Bracket::Round => '(',
            Bracket::Curly => '{',
        }
    }

    pub fn close(self) -> char {
        match self {
            Bracket::Round => ')',
            Bracket::Curly => '}',
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    /// Literal text (leaves and punctuation only)
    pub text: String,
    pub children: Vec<Node>,
    /// Delimiter of a group; `None` for the implicit root group
    pub bracket: Option<Bracket>,
}

impl Node {
    pub fn number(text: impl Into<String>) -> Self {
        Self::leaf(NodeKind::Number, text)
    }

    pub fn symbol(text: impl Into<String>) -> Self {
        Self::leaf(NodeKind::Symbol, text)
    }

    pub fn punct(c: char) -> Self {
        Self::leaf(NodeKind::Punct, c.to_string())
    }

    /// A bracketed group; the bracket tokens are added around `children`
    pub fn group(bracket: Bracket, children: Vec<Node>) -> Self {
        let mut all = Vec::with_capacity(children.len() + 2);
        all.push(Node::punct(bracket.open()));
        all.extend(children);
        all.push(Node::punct(bracket.close()));
        Node {
            kind: NodeKind::Group,
            text: String::new(),
            children: all,
            bracket: Some(bracket),
        }
    }

    /// The implicit top-level group of a program
    pub fn root(children: Vec<Node>) -> Self {
        Node {
            kind: NodeKind::Group,
            text: String::new(),
            children,
            bracket: None,
        }
    }

    fn leaf(kind: NodeKind, text: impl Into<String>) -> Self {
        Node {
            kind,
            text: text.into(),
            children: Vec::new(),
            bracket: None,
        }
    }
}
