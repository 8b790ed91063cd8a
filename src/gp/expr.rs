//! Items related to expressions.

use self::gen::Arity;
use super::func::OperatorId;
use crate::error::{Error, Result};
use fnv::FnvHashMap;
use petgraph::visit::{EdgeRef, Topo};
use petgraph::{self, Incoming};
use std::fmt::{self, Write};

/// A node type that can be evaluated to a single value.
pub trait Evaluate {
    /// Evaluate this node given the already evaluated values of its children and the inputs to
    /// the whole expression.
    fn evaluate(&self, args: &[i64], inputs: &[i64]) -> Result<i64>;
}

/// A single node within an expression tree.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Node {
    /// A function applied to the values of the node's children.
    Operator(OperatorId),
    /// A reference to a position within the input vector.
    Parameter(usize),
    /// A literal value.
    Constant(i64),
}

/// The position of a child within its parent's argument list.
pub type Slot = u32;

/// The directed graph type used to represent an expression.
///
/// Each node within the graph is either an `Operator`, a `Parameter` or a `Constant`. Operators
/// are branch nodes whose arguments are stored on `Incoming` edges, each weighted by the slot of
/// the argument. Parameters and constants are leaf nodes.
pub type DiGraph<N> = petgraph::graph::DiGraph<N, Slot, u32>;

/// The node index type used within the expr DiGraph type.
pub type NodeIndex = petgraph::graph::NodeIndex<u32>;

/// An expression tree.
///
/// The tree exclusively owns its nodes: no two `Expr`s ever share a node. The root is always the
/// node at index `0` as nodes are added in depth-first pre-order.
#[derive(Clone, Debug)]
pub struct Expr {
    graph: DiGraph<Node>,
}

impl Expr {
    /// The index of the root node of every expression.
    pub fn root() -> NodeIndex {
        NodeIndex::new(0)
    }

    /// An expression consisting of a single constant.
    pub fn constant(value: i64) -> Self {
        Self::leaf(Node::Constant(value))
    }

    /// An expression consisting of a single reference to the input at `index`.
    pub fn parameter(index: usize) -> Self {
        Self::leaf(Node::Parameter(index))
    }

    /// Apply `op` to the given argument expressions.
    ///
    /// Returns an `Error::Arity` if the number of children does not match the operator's arity.
    pub fn operator<I>(op: OperatorId, children: I) -> Result<Self>
    where
        I: IntoIterator<Item = Expr>,
    {
        let children = children.into_iter().collect::<Vec<_>>();
        if children.len() != op.arity() {
            return Err(Error::Arity {
                operator: op.name(),
                expected: op.arity(),
                actual: children.len(),
            });
        }
        let mut graph = DiGraph::default();
        let root = graph.add_node(Node::Operator(op));
        for (slot, child) in children.iter().enumerate() {
            let nx = graft(&mut graph, &child.graph, Expr::root());
            graph.add_edge(nx, root, slot as Slot);
        }
        Ok(Expr { graph })
    }

    fn leaf(node: Node) -> Self {
        let mut graph = DiGraph::default();
        graph.add_node(node);
        Expr { graph }
    }

    /// Wrap a graph whose root was the first node added.
    pub(crate) fn from_graph(graph: DiGraph<Node>) -> Self {
        debug_assert!(graph.node_count() > 0, "expression graph must at least have a root");
        Expr { graph }
    }

    /// The underlying graph.
    pub fn graph(&self) -> &DiGraph<Node> {
        &self.graph
    }

    /// The node at the root of the tree.
    pub fn root_node(&self) -> Node {
        self.graph[Expr::root()]
    }

    /// The node at the given index.
    pub fn node(&self, nx: NodeIndex) -> Node {
        self.graph[nx]
    }

    /// The arguments of the node at `nx` ordered by slot.
    pub fn children(&self, nx: NodeIndex) -> Vec<NodeIndex> {
        children(&self.graph, nx)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// The number of edges along the longest path from the root to a leaf.
    ///
    /// A lone leaf has a depth of `0`.
    pub fn depth(&self) -> u32 {
        fn depth_of(graph: &DiGraph<Node>, nx: NodeIndex) -> u32 {
            children(graph, nx)
                .into_iter()
                .map(|c| 1 + depth_of(graph, c))
                .max()
                .unwrap_or(0)
        }
        depth_of(&self.graph, Expr::root())
    }

    /// The greatest parameter index referenced by the tree, if any.
    pub fn max_parameter(&self) -> Option<usize> {
        self.graph
            .node_weights()
            .filter_map(|n| match *n {
                Node::Parameter(index) => Some(index),
                _ => None,
            })
            .max()
    }

    /// Evaluate the expression against the given inputs, producing the value of the root.
    pub fn evaluate(&self, inputs: &[i64]) -> Result<i64> {
        let evaluated = eval(self, inputs)?;
        Ok(evaluated[&Expr::root()])
    }

    /// A human readable dump of the tree, one node per line, each level indented by one space.
    pub fn display(&self, indent: usize) -> String {
        let mut s = String::new();
        self.write_subtree(&mut s, Expr::root(), indent);
        s
    }

    fn write_subtree(&self, s: &mut String, nx: NodeIndex, indent: usize) {
        // Writing to a `String` never fails.
        let _ = writeln!(s, "{:indent$}{}", "", self.graph[nx], indent = indent);
        for child in self.children(nx) {
            self.write_subtree(s, child, indent + 1);
        }
    }
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        subtree_eq(&self.graph, Expr::root(), &other.graph, Expr::root())
    }
}

impl Eq for Expr {}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.display(0))
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Node::Operator(op) => write!(f, "{}", op),
            Node::Parameter(index) => write!(f, "p{}", index),
            Node::Constant(value) => write!(f, "{}", value),
        }
    }
}

impl Node {
    fn name(&self) -> &'static str {
        match *self {
            Node::Operator(op) => op.name(),
            Node::Parameter(_) => "parameter",
            Node::Constant(_) => "constant",
        }
    }
}

impl Arity for Node {
    fn arity(&self) -> usize {
        match *self {
            Node::Operator(op) => op.arity(),
            Node::Parameter(_) | Node::Constant(_) => 0,
        }
    }
}

impl Evaluate for Node {
    fn evaluate(&self, args: &[i64], inputs: &[i64]) -> Result<i64> {
        if args.len() != self.arity() {
            return Err(Error::Arity {
                operator: self.name(),
                expected: self.arity(),
                actual: args.len(),
            });
        }
        match *self {
            Node::Operator(op) => Ok(op.apply(args)),
            Node::Parameter(index) => inputs.get(index).cloned().ok_or(Error::ParameterIndex {
                index,
                len: inputs.len(),
            }),
            Node::Constant(value) => Ok(value),
        }
    }
}

/// Evaluate the given expression, producing the value of every node.
///
/// Nodes are visited in topological order so that every argument is evaluated before the node
/// that consumes it.
pub fn eval(expr: &Expr, inputs: &[i64]) -> Result<FnvHashMap<NodeIndex, i64>> {
    let graph = &expr.graph;
    let mut topo = Topo::new(graph);
    let mut evaluated = FnvHashMap::with_capacity_and_hasher(graph.node_count(), Default::default());
    while let Some(nx) = topo.next(graph) {
        let args = children(graph, nx)
            .iter()
            .map(|c| evaluated[c])
            .collect::<Vec<_>>();
        let value = graph[nx].evaluate(&args, inputs)?;
        evaluated.insert(nx, value);
    }
    Ok(evaluated)
}

/// The arguments of the node at `nx` ordered by slot.
pub fn children(graph: &DiGraph<Node>, nx: NodeIndex) -> Vec<NodeIndex> {
    let mut edges = graph
        .edges_directed(nx, Incoming)
        .map(|e| (*e.weight(), e.source()))
        .collect::<Vec<_>>();
    edges.sort_by_key(|&(slot, _)| slot);
    edges.into_iter().map(|(_, child)| child).collect()
}

/// Copy the subtree of `src` rooted at `nx` into `dst`, returning the index of the copied root.
///
/// Nodes are added in pre-order, so grafting into an empty graph places the root at index `0`.
pub fn graft(dst: &mut DiGraph<Node>, src: &DiGraph<Node>, nx: NodeIndex) -> NodeIndex {
    let copy = dst.add_node(src[nx]);
    for (slot, child) in children(src, nx).into_iter().enumerate() {
        let child_copy = graft(dst, src, child);
        dst.add_edge(child_copy, copy, slot as Slot);
    }
    copy
}

/// Clone the subtree whose root is at the given node into a new expression.
pub fn clone_subtree(expr: &Expr, subtree_root: NodeIndex) -> Expr {
    let mut graph = DiGraph::default();
    graft(&mut graph, &expr.graph, subtree_root);
    Expr { graph }
}

fn subtree_eq(a: &DiGraph<Node>, ax: NodeIndex, b: &DiGraph<Node>, bx: NodeIndex) -> bool {
    if a[ax] != b[bx] {
        return false;
    }
    let a_children = children(a, ax);
    let b_children = children(b, bx);
    a_children.len() == b_children.len()
        && a_children
            .iter()
            .zip(&b_children)
            .all(|(&ac, &bc)| subtree_eq(a, ac, b, bc))
}

/// Functions for generating expression trees.
pub mod gen {
    use super::{DiGraph, Expr, Node, NodeIndex, Slot};
    use crate::gp::func::OperatorId;
    use rand::Rng;
    use serde::{Deserialize, Serialize};

    /// Node types that know their number of inputs / arguments.
    pub trait Arity {
        /// The number of arguments to the node.
        ///
        /// Operator nodes will return 1 or more. Terminal nodes will return 0.
        fn arity(&self) -> usize;
    }

    /// Parameters for the "grow" approach to random tree generation.
    #[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct GenParams {
        /// No path from the root to a leaf will be longer than this.
        pub max_depth: u32,
        /// The probability that a node is an operator, while depth remains.
        pub operator_prob: f64,
        /// The probability that a terminal node is a parameter rather than a constant.
        pub parameter_prob: f64,
    }

    impl Default for GenParams {
        fn default() -> Self {
            GenParams {
                max_depth: 4,
                operator_prob: 0.5,
                parameter_prob: 0.6,
            }
        }
    }

    /// The inclusive range from which constants are drawn.
    pub const CONSTANT_RANGE: ::std::ops::RangeInclusive<i64> = 0..=10;

    /// Generate a random expression using the "grow" approach.
    ///
    /// `param_count` is the length of the input vector the tree will be evaluated against. If it
    /// is `0`, no parameter nodes are generated.
    pub fn random_tree<R>(rng: &mut R, param_count: usize, params: &GenParams) -> Expr
    where
        R: Rng,
    {
        let mut g = DiGraph::default();
        grow(rng, &mut g, param_count, params.max_depth, params);
        Expr::from_graph(g)
    }

    /// Grow a random subtree into the given graph, returning the index of its root.
    ///
    /// The operator branch is disabled once `depth` reaches `0`, bounding the subtree's depth.
    pub fn grow<R>(
        rng: &mut R,
        g: &mut DiGraph<Node>,
        param_count: usize,
        depth: u32,
        params: &GenParams,
    ) -> NodeIndex
    where
        R: Rng,
    {
        if rng.gen::<f64>() < params.operator_prob && depth > 0 {
            let op = OperatorId::ALL[rng.gen_range(0..OperatorId::ALL.len())];
            let a = g.add_node(Node::Operator(op));
            for slot in 0..op.arity() {
                let b = grow(rng, g, param_count, depth - 1, params);
                g.add_edge(b, a, slot as Slot);
            }
            a
        } else if param_count > 0 && rng.gen::<f64>() < params.parameter_prob {
            g.add_node(Node::Parameter(rng.gen_range(0..param_count)))
        } else {
            g.add_node(Node::Constant(rng.gen_range(CONSTANT_RANGE)))
        }
    }
}
