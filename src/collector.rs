//! Reclaims scopes kept alive only by reference cycles.
//!
//! A closure holds its defining scope, and that scope may in turn hold the
//! closure, so reference counting alone never frees either. Every such cycle
//! runs through a scope's bindings. [`Collector::collect`] finds the scopes
//! that nothing outside the object graph refers to and clears their bindings,
//! after which ordinary `Rc` drops free the rest.
//!
//! Outside references are found by trial deletion: a node's strong count minus
//! the references to it from other nodes in the graph is the number of holders
//! the collector cannot see (the host, an interpreter, a running call).

use crate::environment::Environment;
use crate::types::{Closure, Object};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

enum Handle {
    Scope(Rc<Environment>),
    Closure(Rc<Closure>),
    Array(Rc<Vec<Object>>),
}

impl Handle {
    fn from_object(object: &Object) -> Option<Self> {
        match object {
            Object::Function(closure) => Some(Handle::Closure(closure.clone())),
            Object::Array(items) => Some(Handle::Array(items.clone())),
            _ => None,
        }
    }

    fn key(&self) -> *const () {
        match self {
            Handle::Scope(env) => Rc::as_ptr(env) as *const (),
            Handle::Closure(closure) => Rc::as_ptr(closure) as *const (),
            Handle::Array(items) => Rc::as_ptr(items) as *const (),
        }
    }

    fn strong_count(&self) -> usize {
        match self {
            Handle::Scope(env) => Rc::strong_count(env),
            Handle::Closure(closure) => Rc::strong_count(closure),
            Handle::Array(items) => Rc::strong_count(items),
        }
    }

    /// One handle per reference this node holds.
    fn children(&self) -> Vec<Handle> {
        match self {
            Handle::Scope(env) => env
                .outer()
                .map(|outer| Handle::Scope(outer.clone()))
                .into_iter()
                .chain(env.values().iter().filter_map(Handle::from_object))
                .collect(),
            Handle::Closure(closure) => vec![Handle::Scope(closure.env.clone())],
            Handle::Array(items) => items.iter().filter_map(Handle::from_object).collect(),
        }
    }
}

struct Node {
    handle: Handle,
    edges: Vec<usize>,
}

/// The object graph reachable from the tracked scopes. It holds exactly one
/// extra strong reference to every node.
#[derive(Default)]
struct Graph {
    nodes: Vec<Node>,
    index: HashMap<*const (), usize>,
}

impl Graph {
    fn insert(&mut self, handle: Handle) -> usize {
        let key = handle.key();
        if let Some(&i) = self.index.get(&key) {
            return i;
        }
        let i = self.nodes.len();
        self.nodes.push(Node {
            handle,
            edges: Vec::new(),
        });
        self.index.insert(key, i);
        i
    }

    fn build(roots: impl Iterator<Item = Rc<Environment>>) -> Self {
        let mut graph = Self::default();
        for scope in roots {
            graph.insert(Handle::Scope(scope));
        }
        let mut next = 0;
        while next < graph.nodes.len() {
            let children = graph.nodes[next].handle.children();
            let edges = children.into_iter().map(|h| graph.insert(h)).collect();
            graph.nodes[next].edges = edges;
            next += 1;
        }
        graph
    }

    fn live(&self) -> Vec<bool> {
        let mut internal = vec![0; self.nodes.len()];
        for node in &self.nodes {
            for &edge in &node.edges {
                internal[edge] += 1;
            }
        }

        let mut live = vec![false; self.nodes.len()];
        let mut pending: Vec<usize> = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(i, node)| node.handle.strong_count() - 1 > internal[*i])
            .map(|(i, _)| i)
            .collect();
        while let Some(i) = pending.pop() {
            if !live[i] {
                live[i] = true;
                pending.extend(self.nodes[i].edges.iter().filter(|&&e| !live[e]));
            }
        }
        live
    }
}

const MIN_PRUNE_AT: usize = 1024;

pub struct Collector {
    scopes: Vec<Weak<Environment>>,
    prune_at: usize,
}

impl Default for Collector {
    fn default() -> Self {
        Self {
            scopes: Vec::new(),
            prune_at: MIN_PRUNE_AT,
        }
    }
}

impl Collector {
    pub fn track(&mut self, scope: &Rc<Environment>) {
        // Most call scopes die on return; forget them so a long run stays small.
        if self.scopes.len() >= self.prune_at {
            self.scopes.retain(|scope| scope.strong_count() > 0);
            self.prune_at = MIN_PRUNE_AT.max(2 * self.scopes.len());
        }
        self.scopes.push(Rc::downgrade(scope));
    }

    /// Clears every scope unreachable from outside the graph, returning how
    /// many were cleared.
    pub fn collect(&mut self) -> usize {
        self.scopes.retain(|scope| scope.strong_count() > 0);
        let graph = Graph::build(self.scopes.iter().filter_map(Weak::upgrade));
        let live = graph.live();

        let mut cleared = 0;
        for (node, live) in graph.nodes.iter().zip(live) {
            if let (Handle::Scope(scope), false) = (&node.handle, live) {
                scope.clear();
                cleared += 1;
            }
        }
        drop(graph);

        self.scopes.retain(|scope| scope.strong_count() > 0);
        log::debug!(
            "collected {} scopes, {} still tracked",
            cleared,
            self.scopes.len()
        );
        cleared
    }
}
