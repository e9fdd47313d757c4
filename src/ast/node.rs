use crate::{
    ast::{Operator, VariablePath},
    builder::Syntax,
    convert::value_to_json,
    error::TreeError,
    value::Value,
};

/// Index of a node inside its [`Ast`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a node is, independent of its position in the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Literal scalar (string, number, boolean or null)
    Value(Value),

    /// Reference to a value in the evaluation context
    ///
    /// # Example
    /// ```text
    /// "@it.score"
    /// ```
    Variable(VariablePath),

    /// Call of a named function supplied by a function resolver;
    /// children are the operands
    ///
    /// # Example
    /// ```text
    /// {"#add": ["@acc", 1]}
    /// ```
    Function(String),

    /// One or two names bound by a comprehension operator
    ///
    /// # Example
    /// ```text
    /// {"$decl": "acc,it"}
    /// ```
    Declaration(Vec<String>),

    /// Array literal; children are the elements
    Array,

    /// Object literal; children are [`NodeKind::Entry`] nodes
    Object,

    /// One key of an object literal; its single child is the value
    Entry(String),

    /// Reserved operator; children are the operands
    Operator(Operator),
}

/// A node of the expression tree.
///
/// Children are owned by the arena and referenced by id. The parent link is
/// a plain id and is only used while rewriting the tree during building.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    kind: NodeKind,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl Node {
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn operator(&self) -> Option<Operator> {
        match self.kind {
            NodeKind::Operator(op) => Some(op),
            _ => None,
        }
    }

    /// Bound names if this is a declaration node
    pub fn declared_names(&self) -> Option<&[String]> {
        match &self.kind {
            NodeKind::Declaration(names) => Some(names),
            _ => None,
        }
    }

    pub fn is_value(&self) -> bool {
        matches!(self.kind, NodeKind::Value(_))
    }
}

/// Arena holding an expression tree.
///
/// Nodes are only ever appended; a node detached by array unwrapping stays
/// in the arena but is no longer reachable from the root.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Ast {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl Ast {
    /// The root node id. A tree assembled by hand has none until
    /// [`Ast::set_root`] is called; the builder always sets one.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    /// Node ids reachable from the root, parents before children,
    /// siblings in order.
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::new();
        let Some(root) = self.root.filter(|&root| self.contains(root)) else {
            return order;
        };
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.children(id).iter().rev());
        }
        order
    }

    pub fn new() -> Self {
        Self::default()
    }

    /// Append a detached node.
    pub fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            children: Vec::new(),
            parent: None,
        });
        id
    }

    /// Append `child` to `parent`'s children and point it back at `parent`.
    ///
    /// A node has at most one parent and the tree stays acyclic: attaching
    /// a node that already has a parent, or one of `parent`'s own
    /// ancestors, is refused.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        for id in [parent, child] {
            if !self.contains(id) {
                return Err(TreeError::UnknownNode(id.index()));
            }
        }
        if self.node(child).parent.is_some() {
            return Err(TreeError::AlreadyAttached(child.index()));
        }
        let mut ancestor = Some(parent);
        while let Some(id) = ancestor {
            if id == child {
                return Err(TreeError::Cycle {
                    parent: parent.index(),
                    child: child.index(),
                });
            }
            ancestor = self.node(id).parent;
        }
        self.attach(parent, child);
        Ok(())
    }

    /// Unchecked [`Ast::add_child`] for callers that only attach freshly
    /// pushed nodes.
    pub(crate) fn attach(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
    }

    pub(crate) fn mark_root(&mut self, root: NodeId) {
        self.root = Some(root);
    }

    /// Make `root` the root of the tree. It must exist and have no parent.
    pub fn set_root(&mut self, root: NodeId) -> Result<(), TreeError> {
        if !self.contains(root) {
            return Err(TreeError::UnknownNode(root.index()));
        }
        if self.node(root).parent.is_some() {
            return Err(TreeError::AlreadyAttached(root.index()));
        }
        self.root = Some(root);
        Ok(())
    }

    /// Canonicalize a node once all of its children were added.
    ///
    /// Operator and function nodes get their sole array child unwrapped.
    /// Array literals and object entries are left alone so literal data
    /// such as `[[1, 2]]` keeps its shape.
    pub fn post_construct(&mut self, id: NodeId) {
        let kind = self.nodes.get(id.index()).map(Node::kind);
        if matches!(kind, Some(NodeKind::Operator(_) | NodeKind::Function(_))) {
            self.unwrap_array(id);
        }
    }

    /// Flatten a sole array child into its parent's children, so that
    /// `op(a, b)` and `op([a, b])` end up with the same shape.
    pub(crate) fn unwrap_array(&mut self, id: NodeId) {
        let [only] = self.children(id) else {
            return;
        };
        let only = *only;
        if !matches!(self.kind(only), NodeKind::Array) {
            return;
        }
        let grandchildren = std::mem::take(&mut self.nodes[only.index()].children);
        self.nodes[only.index()].parent = None;
        self.nodes[id.index()].children.clear();
        for child in grandchildren {
            self.attach(id, child);
        }
    }

    /// Render the subtree at `id` back into a token tree.
    ///
    /// Building the rendered token again yields a structurally identical tree.
    pub fn to_token(&self, id: NodeId, syntax: &Syntax) -> serde_json::Value {
        let children = || -> Vec<serde_json::Value> {
            self.children(id)
                .iter()
                .map(|&child| self.to_token(child, syntax))
                .collect()
        };
        let single = |key: String, operands: Vec<serde_json::Value>| {
            let mut map = serde_json::Map::new();
            map.insert(key, serde_json::Value::Array(operands));
            serde_json::Value::Object(map)
        };

        match self.kind(id) {
            NodeKind::Value(Value::String(s)) if s.starts_with(syntax.variable_sigil) => {
                serde_json::Value::String(format!("{}{}", syntax.variable_sigil, s))
            }
            NodeKind::Value(v) => value_to_json(v),
            NodeKind::Variable(path) => {
                serde_json::Value::String(format!("{}{}", syntax.variable_sigil, path.name()))
            }
            NodeKind::Function(name) => {
                single(format!("{}{}", syntax.function_sigil, name), children())
            }
            NodeKind::Operator(op) => single(op.token().to_string(), children()),
            NodeKind::Declaration(names) => {
                let mut map = serde_json::Map::new();
                map.insert(
                    syntax.declaration_key.clone(),
                    serde_json::Value::String(names.join(&syntax.name_separator.to_string())),
                );
                serde_json::Value::Object(map)
            }
            NodeKind::Array => serde_json::Value::Array(children()),
            NodeKind::Object => serde_json::Value::Object(
                self.children(id)
                    .iter()
                    .filter_map(|&entry| match self.kind(entry) {
                        NodeKind::Entry(key) => {
                            let value = self.children(entry).first()?;
                            Some((key.clone(), self.to_token(*value, syntax)))
                        }
                        _ => None,
                    })
                    .collect(),
            ),
            NodeKind::Entry(key) => {
                let mut map = serde_json::Map::new();
                if let Some(&value) = self.children(id).first() {
                    map.insert(key.clone(), self.to_token(value, syntax));
                }
                serde_json::Value::Object(map)
            }
        }
    }
}
