//! Mutation and crossover of expression trees.
//!
//! Both operators build an entirely new graph rather than editing their inputs, so the resulting
//! tree never shares nodes with its parents.

use super::expr::gen::{self, GenParams};
use super::expr::{children, graft, DiGraph, Expr, Node, NodeIndex, Slot};
use rand::Rng;

/// The default probability with which each node is replaced by a random subtree.
pub const DEFAULT_MUTATION_PROB: f64 = 0.1;

/// The default probability with which a non-root node is swapped for one from the other parent.
pub const DEFAULT_SWAP_PROB: f64 = 0.7;

/// Produce a mutated copy of `expr`.
///
/// Each node is, with probability `mutation_prob`, replaced along with its children by a random
/// tree generated with the default `GenParams`. Otherwise the node is kept and each of its
/// children is mutated independently.
pub fn mutate<R>(rng: &mut R, expr: &Expr, param_count: usize, mutation_prob: f64) -> Expr
where
    R: Rng,
{
    let params = GenParams::default();
    let mut g = DiGraph::default();
    mutate_subtree(rng, expr.graph(), Expr::root(), &mut g, param_count, mutation_prob, &params);
    Expr::from_graph(g)
}

fn mutate_subtree<R>(
    rng: &mut R,
    src: &DiGraph<Node>,
    nx: NodeIndex,
    dst: &mut DiGraph<Node>,
    param_count: usize,
    mutation_prob: f64,
    params: &GenParams,
) -> NodeIndex
where
    R: Rng,
{
    if rng.gen::<f64>() < mutation_prob {
        return gen::grow(rng, dst, param_count, params.max_depth, params);
    }
    let copy = dst.add_node(src[nx]);
    for (slot, child) in children(src, nx).into_iter().enumerate() {
        let child_copy = mutate_subtree(rng, src, child, dst, param_count, mutation_prob, params);
        dst.add_edge(child_copy, copy, slot as Slot);
    }
    copy
}

/// Cross `a` with `b`, producing a new tree shaped like `a`.
///
/// The tree is walked from the root of `a`. Below the root, each node is, with probability
/// `swap_prob`, replaced by the current subtree of `b`. Otherwise the node of `a` is kept and, if
/// both current nodes are operators, each of its children is crossed with a child of `b` chosen
/// uniformly at random. Where only one of the two current nodes is an operator, `a`'s subtree is
/// copied unchanged.
///
/// The root itself is never swapped.
pub fn crossover<R>(rng: &mut R, a: &Expr, b: &Expr, swap_prob: f64) -> Expr
where
    R: Rng,
{
    let mut g = DiGraph::default();
    let (a, b) = (a.graph(), b.graph());
    cross_subtree(rng, a, Expr::root(), b, Expr::root(), &mut g, swap_prob, true);
    Expr::from_graph(g)
}

#[allow(clippy::too_many_arguments)]
fn cross_subtree<R>(
    rng: &mut R,
    a: &DiGraph<Node>,
    ax: NodeIndex,
    b: &DiGraph<Node>,
    bx: NodeIndex,
    dst: &mut DiGraph<Node>,
    swap_prob: f64,
    is_root: bool,
) -> NodeIndex
where
    R: Rng,
{
    if !is_root && rng.gen::<f64>() < swap_prob {
        return graft(dst, b, bx);
    }
    match (a[ax], b[bx]) {
        (Node::Operator(_), Node::Operator(_)) => {
            let b_children = children(b, bx);
            let copy = dst.add_node(a[ax]);
            for (slot, a_child) in children(a, ax).into_iter().enumerate() {
                let b_child = b_children[rng.gen_range(0..b_children.len())];
                let child_copy = cross_subtree(rng, a, a_child, b, b_child, dst, swap_prob, false);
                dst.add_edge(child_copy, copy, slot as Slot);
            }
            copy
        }
        _ => graft(dst, a, ax),
    }
}
