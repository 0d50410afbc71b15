//! Whole-graph validation.
//!
//! [`validate_graph`] re-derives every structural invariant from scratch. The
//! post-mutation invariant hook runs it with
//! [`GraphValidationOptions::structural`]; callers importing data from outside
//! usually want [`GraphValidationOptions::all`].

use crate::topo_error::TopoError;
use crate::topology::entity::{Link, TopoType};
use crate::topology::graph::TopoGraph;
use crate::topology::id::PersistentId;
use crate::topology::resolver::{OrientationResolver, ResolverOptions, UnknownHandling};

/// Optional validation toggles for graph checks.
#[derive(Debug, Clone, Copy)]
pub struct GraphValidationOptions {
    /// Every link steps exactly one rank down and has the right link kind.
    pub check_ranks: bool,
    /// `parent` / `referrers` mirror the children lists exactly.
    pub check_mirrors: bool,
    /// Bound geometry matches each entity's type.
    pub check_geometry: bool,
    /// Consecutive coedges of every loop share a vertex.
    pub check_loop_closure: bool,
    /// How to handle shells with non-manifold edges.
    pub non_manifold: NonManifoldHandling,
}

impl GraphValidationOptions {
    /// Structural invariants only; cheap enough to run after every edit.
    pub fn structural() -> Self {
        Self {
            check_ranks: true,
            check_mirrors: true,
            check_geometry: true,
            check_loop_closure: false,
            non_manifold: NonManifoldHandling::Ignore,
        }
    }

    /// Enable all graph validation checks.
    pub fn all() -> Self {
        Self {
            check_ranks: true,
            check_mirrors: true,
            check_geometry: true,
            check_loop_closure: true,
            non_manifold: NonManifoldHandling::Error,
        }
    }
}

impl Default for GraphValidationOptions {
    fn default() -> Self {
        Self::structural()
    }
}

/// Behavior for non-manifold detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NonManifoldHandling {
    /// Skip non-manifold detection.
    #[default]
    Ignore,
    /// Log a warning per offending shell.
    Warn,
    /// Return an error on the first offending shell.
    Error,
}

/// Validate `graph` against the selected checks, returning the first failure.
pub fn validate_graph(graph: &TopoGraph, options: GraphValidationOptions) -> Result<(), TopoError> {
    if options.check_ranks || options.check_mirrors || options.check_geometry {
        check_links(graph, options)?;
    }
    if options.check_mirrors {
        check_back_links(graph)?;
    }
    if options.check_loop_closure {
        for lp in graph.entities_of_type(TopoType::Loop) {
            graph.check_loop_closed(lp.id())?;
        }
    }
    validate_non_manifold(graph, options.non_manifold)
}

fn check_links(graph: &TopoGraph, options: GraphValidationOptions) -> Result<(), TopoError> {
    for e in graph.iter() {
        if options.check_geometry {
            e.ty().check_geometry(e.geometry())?;
        }
        let link = e.ty().child_link();
        if let (Some(limit), true) = (e.ty().reference_limit(), options.check_ranks) {
            if e.children().len() > limit {
                return Err(TopoError::ReferenceLimit {
                    id: e.id(),
                    ty: e.ty(),
                    limit,
                });
            }
        }
        for &c in e.children() {
            let child = graph.entity(c)?;
            if options.check_ranks && link.map(|(ty, _)| ty) != Some(child.ty()) {
                return Err(TopoError::TypeRankViolation {
                    parent: e.id(),
                    parent_type: e.ty(),
                    child: c,
                    child_type: child.ty(),
                });
            }
            if options.check_mirrors {
                let mirrored = match link {
                    Some((_, Link::Contains)) => child.parent() == Some(e.id()),
                    Some((_, Link::References)) => {
                        count(child.referrers(), e.id()) == count(e.children(), c)
                    }
                    None => false,
                };
                if !mirrored {
                    return Err(TopoError::MirrorMismatch { src: e.id(), dst: c });
                }
            }
        }
    }
    Ok(())
}

/// Every `parent` and referrer entry must be backed by a child entry.
fn check_back_links(graph: &TopoGraph) -> Result<(), TopoError> {
    for e in graph.iter() {
        if let Some(p) = e.parent() {
            let owner = graph.entity(p)?;
            if !owner.children().contains(&e.id()) {
                return Err(TopoError::MirrorMismatch { src: p, dst: e.id() });
            }
        }
        for &r in e.referrers() {
            let user = graph.entity(r)?;
            if !user.children().contains(&e.id()) {
                return Err(TopoError::MirrorMismatch { src: r, dst: e.id() });
            }
        }
    }
    Ok(())
}

fn count(list: &[PersistentId], id: PersistentId) -> usize {
    list.iter().filter(|&&x| x == id).count()
}

/// Detect edges used more than twice, or twice with the same sense, per shell.
fn validate_non_manifold(graph: &TopoGraph, handling: NonManifoldHandling) -> Result<(), TopoError> {
    if handling == NonManifoldHandling::Ignore {
        return Ok(());
    }
    let resolver = OrientationResolver::new(ResolverOptions {
        require_closed: false,
        unknown: UnknownHandling::Ignore,
    });
    let mut flagged = 0usize;
    for shell in graph.entities_of_type(TopoType::Shell) {
        let verdict = resolver.resolve_shell(graph, shell.id())?;
        let bad = verdict.non_manifold_edges.len() + verdict.mismatched_edges.len();
        if bad == 0 {
            continue;
        }
        match handling {
            NonManifoldHandling::Warn => {
                log::warn!(
                    "Non-manifold shell detected: shell={} non_manifold_edges={:?} mismatched_edges={:?}",
                    shell.id(),
                    verdict.non_manifold_edges,
                    verdict.mismatched_edges
                );
                flagged += 1;
            }
            NonManifoldHandling::Error => return verdict.into_result(),
            NonManifoldHandling::Ignore => {}
        }
    }
    if flagged > 0 {
        log::debug!("{flagged} shell(s) with non-manifold findings");
    }
    Ok(())
}
