//! Domain rules and the problem classifier

use crate::classifier::types::Problem;
use crate::errors::Result;
use crate::graph::{DependencyGraph, Node, NodeId, SharedGraph};
use std::fmt;
use std::sync::Arc;

/// Matcher used by predicate rules
pub type TagMatcher = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Rewrites a declared domain tag
#[derive(Clone)]
pub enum DomainRule {
    /// Tag equal to `from` becomes `to`
    Exact { from: String, to: String },

    /// Tag accepted by `matcher` becomes `to`
    Predicate {
        name: String,
        matcher: TagMatcher,
        to: String,
    },
}

impl DomainRule {
    /// Exact-match rule
    pub fn exact(from: impl Into<String>, to: impl Into<String>) -> Self {
        DomainRule::Exact {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Predicate rule
    pub fn predicate<F>(name: impl Into<String>, matcher: F, to: impl Into<String>) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        DomainRule::Predicate {
            name: name.into(),
            matcher: Arc::new(matcher),
            to: to.into(),
        }
    }

    /// Rewritten tag if this rule matches `tag`
    pub fn apply(&self, tag: &str) -> Option<&str> {
        match self {
            DomainRule::Exact { from, to } if from == tag => Some(to.as_str()),
            DomainRule::Predicate { matcher, to, .. } if matcher(tag) => Some(to.as_str()),
            _ => None,
        }
    }
}

impl fmt::Debug for DomainRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainRule::Exact { from, to } => f
                .debug_struct("Exact")
                .field("from", from)
                .field("to", to)
                .finish(),
            DomainRule::Predicate { name, to, .. } => f
                .debug_struct("Predicate")
                .field("name", name)
                .field("to", to)
                .finish(),
        }
    }
}

/// Turns problems into graph nodes
///
/// Classification is a pure function of the descriptor and the rule list:
/// the first matching rule rewrites the declared tag, otherwise it passes
/// through unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProblemClassifier {
    rules: Vec<DomainRule>,
}

impl ProblemClassifier {
    /// Classifier with no rules
    pub fn new() -> Self {
        Self::default()
    }

    /// Classifier with an ordered rule list
    pub fn with_rules(rules: Vec<DomainRule>) -> Self {
        Self { rules }
    }

    /// Append a rule; earlier rules take precedence
    pub fn add_rule(&mut self, rule: DomainRule) {
        self.rules.push(rule);
    }

    /// Registered rules in precedence order
    pub fn rules(&self) -> &[DomainRule] {
        &self.rules
    }

    /// Domain tag assigned to a declared tag
    pub fn domain_for<'a>(&'a self, declared: &'a str) -> &'a str {
        self.rules
            .iter()
            .find_map(|rule| rule.apply(declared))
            .unwrap_or(declared)
    }

    /// Build the node for a problem
    pub fn classify(&self, problem: &Problem) -> Node {
        let node = Node::new(problem.id.clone(), self.domain_for(&problem.domain))
            .with_deps(problem.deps.iter().cloned());
        match problem.aux_cost {
            Some(cost) => node.with_aux_cost(cost),
            None => node,
        }
    }

    /// Classify and insert into the graph
    pub fn submit(&self, graph: &mut DependencyGraph, problem: &Problem) -> Result<NodeId> {
        let node = self.classify(problem);
        let id = node.id.clone();
        tracing::debug!(node = %id, domain = %node.domain, "problem classified");
        graph.insert_node(node)?;
        Ok(id)
    }

    /// Classify and insert a batch; all problems are committed or none
    pub fn submit_all(&self, graph: &mut DependencyGraph, problems: &[Problem]) -> Result<Vec<NodeId>> {
        let nodes: Vec<Node> = problems.iter().map(|p| self.classify(p)).collect();
        let ids = nodes.iter().map(|n| n.id.clone()).collect();
        graph.insert_batch(nodes)?;
        Ok(ids)
    }

    /// Classify and insert through a shared handle
    pub async fn submit_shared(&self, graph: &SharedGraph, problem: &Problem) -> Result<NodeId> {
        let node = self.classify(problem);
        let id = node.id.clone();
        graph.insert_node(node).await?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::ComplexityClass;
    use crate::errors::GateError;

    #[test]
    fn test_classify_passes_tag_through() {
        let classifier = ProblemClassifier::new();
        let node = classifier.classify(
            &Problem::new("n1", "iaas")
                .with_deps(["a", "b"])
                .with_aux_cost(ComplexityClass::Logarithmic),
        );
        assert_eq!(node.domain, "iaas");
        assert_eq!(node.deps, vec!["a", "b"]);
        assert_eq!(node.aux_cost, Some(ComplexityClass::Logarithmic));
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let classifier = ProblemClassifier::with_rules(vec![
            DomainRule::exact("infrastructure", "iaas"),
            DomainRule::predicate("infra-prefix", |t| t.starts_with("infra"), "infra-other"),
        ]);
        assert_eq!(classifier.domain_for("infrastructure"), "iaas");
        assert_eq!(classifier.domain_for("infra-net"), "infra-other");
        assert_eq!(classifier.domain_for("baas"), "baas");
    }

    #[test]
    fn test_classify_is_pure() {
        let classifier = ProblemClassifier::with_rules(vec![DomainRule::exact("a", "b")]);
        let problem = Problem::new("n", "a");
        assert_eq!(classifier.classify(&problem), classifier.classify(&problem));
    }

    #[test]
    fn test_submit_forwards_graph_error() {
        let classifier = ProblemClassifier::new();
        let mut graph = DependencyGraph::new();
        classifier.submit(&mut graph, &Problem::new("a", "x")).unwrap();

        let err = classifier
            .submit(&mut graph, &Problem::new("a", "x").with_deps(["a"]))
            .unwrap_err();
        assert!(matches!(err, GateError::Cycle { .. }));
        assert!(graph.get("a").unwrap().deps.is_empty());
    }

    #[test]
    fn test_submit_all_atomic() {
        let classifier = ProblemClassifier::new();
        let mut graph = DependencyGraph::new();
        let ids = classifier
            .submit_all(
                &mut graph,
                &[Problem::new("b", "x").with_deps(["a"]), Problem::new("a", "x")],
            )
            .unwrap();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_rule_debug_hides_matcher() {
        let rule = DomainRule::predicate("any", |_| true, "x");
        assert!(format!("{rule:?}").contains("any"));
    }
}
