//! Orientation analysis over shells.
//!
//! The resolver is a pure function of a graph snapshot: it never mutates, and
//! its findings come back as an [`OrientationVerdict`] instead of an error.
//! Callers that want to abort on any problem use
//! [`OrientationVerdict::into_result`].
//!
//! For every edge of a shell the resolver collects its uses, one per coedge,
//! each carrying the *effective* orientation `face ∘ loop ∘ coedge`. In a
//! consistently oriented manifold shell every interior edge is used exactly
//! twice, in opposite senses.

use std::collections::{BTreeMap, VecDeque};

use itertools::Itertools;

use crate::topo_error::TopoError;
use crate::topology::entity::TopoType;
use crate::topology::graph::TopoGraph;
use crate::topology::id::PersistentId;
use crate::topology::orientation::{Orientation, accumulate_path};

/// What to do with uses whose effective orientation is `Unknown`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum UnknownHandling {
    /// List the edge as unresolved; [`OrientationVerdict::into_result`] fails.
    #[default]
    Report,
    /// Skip the orientation comparison for the edge.
    Ignore,
}

/// Resolver configuration.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Boundary edges are violations (a solid's shell must be closed).
    pub require_closed: bool,
    pub unknown: UnknownHandling,
}

impl ResolverOptions {
    /// Options used for the shells of a solid.
    pub fn closed() -> Self {
        Self {
            require_closed: true,
            ..Self::default()
        }
    }
}

/// One use of an edge inside a shell.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EdgeUse {
    pub face: PersistentId,
    pub coedge: PersistentId,
    /// `face ∘ loop ∘ coedge`.
    pub orientation: Orientation,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ViolationKind {
    /// Used once; only a violation when the shell must be closed.
    Boundary,
    /// Used twice with the same effective orientation.
    NonManifoldOrientation,
    /// Used more than twice.
    NonManifoldTopology,
    /// A use has unknown effective orientation.
    Unresolved,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeViolation {
    pub edge: PersistentId,
    pub kind: ViolationKind,
}

/// Findings for one shell. All edge lists are sorted by id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrientationVerdict {
    pub shell: PersistentId,
    pub face_count: usize,
    /// Distinct edges used by the shell.
    pub edge_count: usize,
    pub boundary_edges: Vec<PersistentId>,
    pub mismatched_edges: Vec<PersistentId>,
    pub non_manifold_edges: Vec<PersistentId>,
    pub unresolved_edges: Vec<PersistentId>,
    /// Coedges with no edge bound; they take no part in the analysis.
    pub unbound_coedges: Vec<PersistentId>,
    pub options: ResolverOptions,
}

impl OrientationVerdict {
    pub fn is_closed(&self) -> bool {
        self.boundary_edges.is_empty()
    }

    /// No violation under the options the verdict was computed with.
    pub fn is_consistent(&self) -> bool {
        self.violations().is_empty()
    }

    /// Every violation, ordered by edge then kind.
    pub fn violations(&self) -> Vec<EdgeViolation> {
        let tag = |edges: &[PersistentId], kind| {
            edges
                .iter()
                .map(move |&edge| EdgeViolation { edge, kind })
                .collect::<Vec<_>>()
        };
        let mut out = tag(&self.mismatched_edges, ViolationKind::NonManifoldOrientation);
        out.extend(tag(&self.non_manifold_edges, ViolationKind::NonManifoldTopology));
        if self.options.unknown == UnknownHandling::Report {
            out.extend(tag(&self.unresolved_edges, ViolationKind::Unresolved));
        }
        if self.options.require_closed {
            out.extend(tag(&self.boundary_edges, ViolationKind::Boundary));
        }
        out.sort_unstable();
        out
    }

    /// First violation as an error, most severe kind first.
    pub fn into_result(self) -> Result<(), TopoError> {
        if !self.non_manifold_edges.is_empty() {
            return Err(TopoError::NonManifoldTopology {
                edges: self.non_manifold_edges,
            });
        }
        if !self.mismatched_edges.is_empty() {
            return Err(TopoError::NonManifoldOrientation {
                edges: self.mismatched_edges,
            });
        }
        if self.options.unknown == UnknownHandling::Report && !self.unresolved_edges.is_empty() {
            return Err(TopoError::UnresolvedOrientation {
                edges: self.unresolved_edges,
            });
        }
        if self.options.require_closed && !self.boundary_edges.is_empty() {
            return Err(TopoError::OpenShell {
                shell: self.shell,
                boundary_edges: self.boundary_edges,
            });
        }
        Ok(())
    }
}

/// Face flips that make a shell consistently oriented.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrientationPlan {
    pub shell: PersistentId,
    /// Faces whose orientation must be reversed, ascending.
    pub flips: Vec<PersistentId>,
    /// Edges whose constraint contradicts the rest of their component.
    /// Non-empty means the shell cannot be oriented.
    pub conflicts: Vec<PersistentId>,
    /// Connected face components found through manifold edges.
    pub components: usize,
}

impl OrientationPlan {
    pub fn is_orientable(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn is_noop(&self) -> bool {
        self.flips.is_empty()
    }
}

/// Edge uses of one shell, grouped by edge.
struct ShellUses {
    faces: Vec<PersistentId>,
    by_edge: BTreeMap<PersistentId, Vec<EdgeUse>>,
    unbound: Vec<PersistentId>,
}

fn collect_uses(graph: &TopoGraph, shell: PersistentId) -> Result<ShellUses, TopoError> {
    let faces = graph.entity_of(shell, TopoType::Shell)?.children().to_vec();
    let mut uses = Vec::new();
    let mut unbound = Vec::new();
    for &face_id in &faces {
        let face = graph.entity_of(face_id, TopoType::Face)?;
        for &loop_id in face.children() {
            let lp = graph.entity_of(loop_id, TopoType::Loop)?;
            for &coedge_id in lp.children() {
                let coedge = graph.entity_of(coedge_id, TopoType::Coedge)?;
                let Some(&edge) = coedge.children().first() else {
                    unbound.push(coedge_id);
                    continue;
                };
                let orientation = accumulate_path([
                    face.orientation(),
                    lp.orientation(),
                    coedge.orientation(),
                ]);
                uses.push((
                    edge,
                    EdgeUse {
                        face: face_id,
                        coedge: coedge_id,
                        orientation,
                    },
                ));
            }
        }
    }
    unbound.sort_unstable();
    let by_edge = uses.into_iter().into_group_map().into_iter().collect();
    Ok(ShellUses {
        faces,
        by_edge,
        unbound,
    })
}

/// Analyses shells and solids of a [`TopoGraph`].
#[derive(Copy, Clone, Debug, Default)]
pub struct OrientationResolver {
    options: ResolverOptions,
}

impl OrientationResolver {
    pub fn new(options: ResolverOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> ResolverOptions {
        self.options
    }

    /// Edge uses of `shell`, grouped by edge in ascending edge order.
    pub fn edge_uses(
        &self,
        graph: &TopoGraph,
        shell: PersistentId,
    ) -> Result<BTreeMap<PersistentId, Vec<EdgeUse>>, TopoError> {
        Ok(collect_uses(graph, shell)?.by_edge)
    }

    /// Classify every edge of `shell`.
    ///
    /// # Errors
    /// Only structural problems (missing entities, wrong types); orientation
    /// findings are part of the verdict.
    pub fn resolve_shell(
        &self,
        graph: &TopoGraph,
        shell: PersistentId,
    ) -> Result<OrientationVerdict, TopoError> {
        let uses = collect_uses(graph, shell)?;
        let mut verdict = OrientationVerdict {
            shell,
            face_count: uses.faces.len(),
            edge_count: uses.by_edge.len(),
            boundary_edges: Vec::new(),
            mismatched_edges: Vec::new(),
            non_manifold_edges: Vec::new(),
            unresolved_edges: Vec::new(),
            unbound_coedges: uses.unbound,
            options: self.options,
        };
        for (&edge, edge_uses) in &uses.by_edge {
            let unknown = edge_uses.iter().any(|u| !u.orientation.is_known());
            match edge_uses.as_slice() {
                [_] => {
                    verdict.boundary_edges.push(edge);
                    if unknown {
                        verdict.unresolved_edges.push(edge);
                    }
                }
                [a, b] => {
                    if unknown {
                        verdict.unresolved_edges.push(edge);
                    } else if a.orientation == b.orientation {
                        verdict.mismatched_edges.push(edge);
                    }
                }
                _ => verdict.non_manifold_edges.push(edge),
            }
        }
        if !verdict.is_consistent() {
            log::debug!(
                "shell {shell}: {} violation(s) over {} edges",
                verdict.violations().len(),
                verdict.edge_count
            );
        }
        Ok(verdict)
    }

    /// Verdicts for every shell of `solid`, always requiring closed shells.
    pub fn resolve_solid(
        &self,
        graph: &TopoGraph,
        solid: PersistentId,
    ) -> Result<Vec<OrientationVerdict>, TopoError> {
        let closed = OrientationResolver::new(ResolverOptions {
            require_closed: true,
            ..self.options
        });
        graph
            .entity_of(solid, TopoType::Solid)?
            .children()
            .iter()
            .map(|&shell| closed.resolve_shell(graph, shell))
            .collect()
    }

    /// Propagate orientation across manifold edges, face by face.
    ///
    /// Each connected component is seeded from its first face in shell order.
    /// When more than half of a component would flip, the complement is
    /// flipped instead, which yields the same relative orientation with fewer
    /// changes. Edges used more than twice, by a single face, or with unknown
    /// orientation constrain nothing.
    pub fn plan(&self, graph: &TopoGraph, shell: PersistentId) -> Result<OrientationPlan, TopoError> {
        let uses = collect_uses(graph, shell)?;
        let index: BTreeMap<PersistentId, usize> = uses
            .faces
            .iter()
            .enumerate()
            .map(|(i, &f)| (f, i))
            .collect();

        // (neighbour face index, must differ in flip state, edge)
        let mut adjacency: Vec<Vec<(usize, bool, PersistentId)>> = vec![Vec::new(); uses.faces.len()];
        for (&edge, edge_uses) in &uses.by_edge {
            let [a, b] = edge_uses.as_slice() else {
                continue;
            };
            if a.face == b.face || !a.orientation.is_known() || !b.orientation.is_known() {
                continue;
            }
            let (Some(&ia), Some(&ib)) = (index.get(&a.face), index.get(&b.face)) else {
                continue;
            };
            let differ = a.orientation == b.orientation;
            adjacency[ia].push((ib, differ, edge));
            adjacency[ib].push((ia, differ, edge));
        }

        let mut flip: Vec<Option<bool>> = vec![None; uses.faces.len()];
        let mut plan = OrientationPlan {
            shell,
            flips: Vec::new(),
            conflicts: Vec::new(),
            components: 0,
        };
        for seed in 0..uses.faces.len() {
            if flip[seed].is_some() {
                continue;
            }
            plan.components += 1;
            flip[seed] = Some(false);
            let mut members = vec![seed];
            let mut queue = VecDeque::from([seed]);
            while let Some(cur) = queue.pop_front() {
                let cur_flip = flip[cur].unwrap_or(false);
                for &(nb, differ, edge) in &adjacency[cur] {
                    let want = cur_flip ^ differ;
                    match flip[nb] {
                        None => {
                            flip[nb] = Some(want);
                            members.push(nb);
                            queue.push_back(nb);
                        }
                        Some(have) if have != want => plan.conflicts.push(edge),
                        Some(_) => {}
                    }
                }
            }
            let flipped = members.iter().filter(|&&m| flip[m] == Some(true)).count();
            if flipped * 2 > members.len() {
                for &m in &members {
                    flip[m] = flip[m].map(|f| !f);
                }
            }
        }

        plan.flips = uses
            .faces
            .iter()
            .zip(&flip)
            .filter(|(_, f)| **f == Some(true))
            .map(|(&face, _)| face)
            .sorted_unstable()
            .collect();
        plan.conflicts.sort_unstable();
        plan.conflicts.dedup();
        log::debug!(
            "orientation plan for shell {shell}: {} flip(s), {} conflict(s), {} component(s)",
            plan.flips.len(),
            plan.conflicts.len(),
            plan.components
        );
        Ok(plan)
    }
}

/// [`OrientationResolver::resolve_shell`] with default options.
pub fn resolve_shell(graph: &TopoGraph, shell: PersistentId) -> Result<OrientationVerdict, TopoError> {
    OrientationResolver::default().resolve_shell(graph, shell)
}

/// [`OrientationResolver::resolve_solid`] with default options.
pub fn resolve_solid(
    graph: &TopoGraph,
    solid: PersistentId,
) -> Result<Vec<OrientationVerdict>, TopoError> {
    OrientationResolver::default().resolve_solid(graph, solid)
}

/// [`OrientationResolver::plan`] with default options.
pub fn plan_orientation(graph: &TopoGraph, shell: PersistentId) -> Result<OrientationPlan, TopoError> {
    OrientationResolver::default().plan(graph, shell)
}
