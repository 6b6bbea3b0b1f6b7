use crate::error::{QueryError, StudioError};
use crate::guidance::{
    BEHAVIOR_LABEL, CONCEPT_LABEL, CompetencyGuide, INDICATOR_LABEL, LinkedNode, SkillPlan,
    TASK_LABEL,
};
use crate::interaction::{Interaction, InteractionState};
use crate::service::{CATALOG_FIELD, GraphQuery, QueryService};
use crate::settings::StudioSettings;
use crate::tutor::{Question, QuestionRequest, QuestionStats, TutorBackend};
use crossbeam_channel::Receiver;
use graphdesk_core::{
    CoreError, EdgeId, NodeId, Properties, PropertyValue, QueryResult, RecordValue,
};
use graphdesk_events::{EditKind, Event, EventBus, GraphEvent};
use graphdesk_graph::{
    EditError, EvidenceRecord, FilterState, FrameBuilder, GraphProjector, GraphState, LayoutMode,
    MergeOutcome, Normalizer, RecordShape, RenderFrame, VisualGraph, VisualNode, merge,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What a fetch did to the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Replaced { nodes: usize, edges: usize },
    Extended { added_nodes: usize, added_edges: usize },
    NoFurtherNeighbors,
    /// A newer response had already been applied.
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    Labels,
    RelationshipTypes,
}

struct StudioState {
    graph: GraphState,
    filter: FilterState,
    layout: LayoutMode,
    /// Query that last replaced the canvas; re-run by `refresh`.
    last_fetch: Option<GraphQuery>,
    interaction: InteractionState,
    next_ticket: u64,
    latest_applied: u64,
}

/// Headless orchestrator for the graph studio.
///
/// Owns the on-screen graph, the active filter and the interaction state.
/// Fetches run against the [`QueryService`]; their results are normalized,
/// projected and then either replace the canvas or merge into it. Nothing is
/// changed until the service has answered successfully.
pub struct StudioController {
    state: Arc<Mutex<StudioState>>,
    settings: StudioSettings,
    normalizer: Normalizer,
    projector: GraphProjector,
    service: Arc<dyn QueryService>,
    tutor: Option<Arc<dyn TutorBackend>>,
    bus: EventBus,
}

fn name_properties(name: &str) -> Properties {
    let mut properties = Properties::new();
    properties.insert("name".to_string(), PropertyValue::from(name));
    properties
}

impl StudioController {
    pub fn new(service: Arc<dyn QueryService>, settings: StudioSettings) -> Self {
        let normalizer =
            Normalizer::new(settings.query.id_strategy).with_fields(settings.query.fields.clone());
        let projector = GraphProjector::new(settings.grouping.clone());
        Self {
            state: Arc::new(Mutex::new(StudioState {
                graph: GraphState::new(),
                filter: FilterState::default(),
                layout: settings.layout.mode,
                last_fetch: None,
                interaction: InteractionState::new(),
                next_ticket: 0,
                latest_applied: 0,
            })),
            settings,
            normalizer,
            projector,
            service,
            tutor: None,
            bus: EventBus::new(),
        }
    }

    pub fn with_tutor(mut self, tutor: Arc<dyn TutorBackend>) -> Self {
        self.tutor = Some(tutor);
        self
    }

    /// Sets the filter the first fetch will use.
    pub fn with_filter(self, filter: FilterState) -> Self {
        self.state.lock().filter = filter;
        self
    }

    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.bus = bus;
        self
    }

    pub fn settings(&self) -> &StudioSettings {
        &self.settings
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.bus
    }

    /// Subscribe to studio events.
    pub fn events(&self) -> Receiver<Event> {
        self.bus.receiver()
    }

    pub fn graph(&self) -> VisualGraph {
        self.state.lock().graph.graph().clone()
    }

    pub fn revision(&self) -> u64 {
        self.state.lock().graph.revision()
    }

    pub fn filter(&self) -> FilterState {
        self.state.lock().filter.clone()
    }

    pub fn interaction(&self) -> InteractionState {
        self.state.lock().interaction.clone()
    }

    fn require_tutor(&self) -> Result<Arc<dyn TutorBackend>, StudioError> {
        self.tutor.clone().ok_or(StudioError::NoTutor)
    }

    fn tutor_module(&self) -> Result<String, StudioError> {
        self.settings
            .tutor
            .module_name
            .clone()
            .ok_or_else(|| StudioError::invalid_argument("no tutor module configured"))
    }

    fn report<E: std::fmt::Display>(&self, context: &str, err: &E) {
        warn!("{} failed: {}", context, err);
        self.bus.publish(Event::ShowError {
            message: format!("{context} failed: {err}"),
        });
    }

    // Fetching

    /// Runs `query` and projects the result under the filter that was active
    /// when the request went out.
    async fn fetch(&self, query: &GraphQuery) -> Result<(u64, VisualGraph), StudioError> {
        let (ticket, filter) = {
            let mut state = self.state.lock();
            state.next_ticket += 1;
            (state.next_ticket, state.filter.clone())
        };

        let result = match self.service.run(query).await {
            Ok(result) => result,
            Err(e) => {
                self.report(&query.describe(), &e);
                return Err(e.into());
            }
        };

        let batch = self.normalizer.normalize_batch(query.shape(), &result);
        if batch.skipped > 0 {
            debug!("Skipped {} malformed rows from {}", batch.skipped, query.describe());
        }
        Ok((ticket, self.projector.project_batch(&batch, &filter)))
    }

    /// Whether a response with `ticket` may still be applied.
    fn accept(&self, state: &mut StudioState, ticket: u64) -> bool {
        if self.settings.query.discard_stale_responses && ticket < state.latest_applied {
            debug!(
                "Discarding response {} (latest applied {})",
                ticket, state.latest_applied
            );
            self.bus.publish(Event::StaleResponseDiscarded {
                ticket,
                latest_applied: state.latest_applied,
            });
            return false;
        }
        state.latest_applied = state.latest_applied.max(ticket);
        true
    }

    async fn replace_with(&self, query: GraphQuery) -> Result<FetchOutcome, StudioError> {
        let (ticket, graph) = self.fetch(&query).await?;
        let (nodes, edges) = (graph.node_count(), graph.edge_count());

        let revision = {
            let mut state = self.state.lock();
            if !self.accept(&mut state, ticket) {
                return Ok(FetchOutcome::Discarded);
            }
            let current = std::mem::take(&mut state.graph);
            state.graph = current.replaced(graph);
            state.last_fetch = Some(query.clone());
            state.interaction = InteractionState::new();
            state.graph.revision()
        };

        info!("{}: {} nodes, {} edges", query.describe(), nodes, edges);
        self.bus.publish(Event::GraphReplaced {
            nodes,
            edges,
            revision,
        });
        self.bus.publish(Event::StatusUpdate {
            message: format!("Loaded {nodes} nodes and {edges} relationships"),
        });
        Ok(FetchOutcome::Replaced { nodes, edges })
    }

    pub async fn load_overview(&self) -> Result<FetchOutcome, StudioError> {
        self.replace_with(GraphQuery::Overview {
            limit: self.settings.query.overview_limit,
        })
        .await
    }

    /// Replaces the canvas with the traversals starting at the first node
    /// matching `keyword`. `depth` defaults to the configured path depth.
    pub async fn search_paths(
        &self,
        keyword: &str,
        depth: Option<u32>,
    ) -> Result<FetchOutcome, StudioError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(StudioError::invalid_argument("search keyword must not be empty"));
        }
        let depth = depth.unwrap_or(self.settings.query.path_depth);
        if depth == 0 {
            return Err(StudioError::invalid_argument("path depth must be at least 1"));
        }
        self.replace_with(GraphQuery::Paths {
            keyword: keyword.to_string(),
            depth,
            limit: self.settings.query.path_limit,
        })
        .await
    }

    /// Fetches the neighbours of `id` and merges them into the canvas.
    pub async fn expand(&self, id: &NodeId) -> Result<FetchOutcome, StudioError> {
        let query = GraphQuery::Neighbors {
            id: id.clone(),
            limit: self.settings.query.expand_limit,
        };
        let (ticket, incoming) = self.fetch(&query).await?;

        let (outcome, revision) = {
            let mut state = self.state.lock();
            if !self.accept(&mut state, ticket) {
                return Ok(FetchOutcome::Discarded);
            }
            let current = std::mem::take(&mut state.graph);
            let (next, outcome) = merge(current, incoming);
            state.graph = next;
            (outcome, state.graph.revision())
        };

        match outcome {
            MergeOutcome::NoFurtherNeighbors => {
                info!("No further neighbours for {}", id);
                self.bus
                    .publish(Event::NoFurtherNeighbors { center: id.clone() });
                Ok(FetchOutcome::NoFurtherNeighbors)
            }
            MergeOutcome::Extended {
                added_nodes,
                added_edges,
            } => {
                info!(
                    "Expanded {}: {} new nodes, {} new edges",
                    id, added_nodes, added_edges
                );
                self.bus.publish(Event::GraphExtended {
                    center: id.clone(),
                    added_nodes,
                    added_edges,
                    revision,
                });
                Ok(FetchOutcome::Extended {
                    added_nodes,
                    added_edges,
                })
            }
        }
    }

    /// Re-runs the query that last replaced the canvas, or the overview.
    pub async fn refresh(&self) -> Result<FetchOutcome, StudioError> {
        let last = self.state.lock().last_fetch.clone();
        match last {
            Some(query) => self.replace_with(query).await,
            None => self.load_overview().await,
        }
    }

    pub async fn set_filter(&self, filter: FilterState) -> Result<FetchOutcome, StudioError> {
        self.state.lock().filter = filter;
        self.refresh().await
    }

    pub async fn clear_filter(&self) -> Result<FetchOutcome, StudioError> {
        self.set_filter(FilterState::default()).await
    }

    /// Runs a query whose result never reaches the canvas.
    async fn lookup(&self, query: &GraphQuery) -> Result<QueryResult, StudioError> {
        self.service.run(query).await.map_err(|e| {
            self.report(&query.describe(), &e);
            StudioError::from(e)
        })
    }

    /// Distinct labels or relationship types known to the service, for
    /// populating filter pickers.
    pub async fn catalog(&self, kind: CatalogKind) -> Result<Vec<String>, StudioError> {
        let limit = self.settings.query.catalog_limit;
        let query = match kind {
            CatalogKind::Labels => GraphQuery::LabelCatalog { limit },
            CatalogKind::RelationshipTypes => GraphQuery::TypeCatalog { limit },
        };
        let result = self.lookup(&query).await?;

        let mut values = Vec::new();
        for record in &result.records {
            match record.get(CATALOG_FIELD) {
                Some(RecordValue::Scalar(value)) => values.extend(value.as_text()),
                Some(RecordValue::Null) | None => {}
                Some(other) => debug!("Skipping catalog row holding a {}", other.kind_name()),
            }
        }
        Ok(values)
    }

    /// Node search for pickers. Does not touch the canvas.
    pub async fn search_nodes(
        &self,
        keyword: &str,
        label: Option<&str>,
    ) -> Result<Vec<VisualNode>, StudioError> {
        let query = GraphQuery::Search {
            keyword: keyword.trim().to_string(),
            label: label.map(str::to_string),
            limit: self.settings.query.search_limit,
        };
        let result = self.lookup(&query).await?;
        let batch = self.normalizer.normalize_batch(RecordShape::SingleHop, &result);
        Ok(self
            .projector
            .project_records(&batch.records, &FilterState::default())
            .nodes)
    }

    /// Nodes linked to `id`, one list per entry of `labels`. A node carrying
    /// several of the labels shows up in each of their lists.
    async fn linked_by_label(
        &self,
        id: &NodeId,
        labels: &[&str],
    ) -> Result<Vec<Vec<LinkedNode>>, StudioError> {
        let limit = self.settings.query.related_limit;
        let query = GraphQuery::Related {
            id: id.clone(),
            labels: labels.iter().map(|l| l.to_string()).collect(),
            limit,
        };
        let result = self.lookup(&query).await?;
        if result.is_empty() {
            return Err(QueryError::node_not_found(id.as_str()).into());
        }

        let batch = self.normalizer.normalize_batch(RecordShape::SingleHop, &result);
        let mut groups: Vec<Vec<LinkedNode>> = vec![Vec::new(); labels.len()];
        for linked in batch.records.iter().filter_map(|r| r.m.as_ref()) {
            for (slot, label) in labels.iter().enumerate() {
                let group = &mut groups[slot];
                if group.len() < limit
                    && linked.labels.iter().any(|l| l == label)
                    && group.iter().all(|n| n.id != linked.id)
                {
                    group.push(LinkedNode::from(linked));
                }
            }
        }
        Ok(groups)
    }

    /// Prerequisite concepts and practice tasks linked to a skill.
    pub async fn skill_plan(&self, id: &NodeId) -> Result<SkillPlan, StudioError> {
        let mut groups = self
            .linked_by_label(id, &[CONCEPT_LABEL, TASK_LABEL])
            .await?
            .into_iter();
        Ok(SkillPlan {
            skill: id.clone(),
            concepts: groups.next().unwrap_or_default(),
            tasks: groups.next().unwrap_or_default(),
        })
    }

    /// Indicators and behaviours linked to a competency.
    pub async fn competency_guide(&self, id: &NodeId) -> Result<CompetencyGuide, StudioError> {
        let mut groups = self
            .linked_by_label(id, &[INDICATOR_LABEL, BEHAVIOR_LABEL])
            .await?
            .into_iter();
        Ok(CompetencyGuide {
            competency: id.clone(),
            indicators: groups.next().unwrap_or_default(),
            behaviors: groups.next().unwrap_or_default(),
        })
    }

    // Direct edits

    fn require_node(&self, id: &NodeId) -> Result<(), StudioError> {
        if self.state.lock().graph.graph().contains_node(id) {
            Ok(())
        } else {
            Err(EditError::UnknownNode(id.clone()).into())
        }
    }

    /// Applies a confirmed edit to the canvas. The state is left as it was if
    /// `edit` fails.
    fn apply_edit<F>(&self, kind: EditKind, edit: F) -> Result<u64, StudioError>
    where
        F: FnOnce(GraphState) -> Result<GraphState, EditError>,
    {
        let revision = {
            let mut state = self.state.lock();
            let next = edit(state.graph.clone())?;
            state.graph = next;
            match &kind {
                EditKind::NodeDeleted(id) => state.interaction.forget_node(id),
                EditKind::RelationDeleted(id) => state.interaction.forget_edge(id),
                _ => {}
            }
            state.graph.revision()
        };
        self.bus.publish(Event::EditApplied {
            edit: kind,
            revision,
        });
        Ok(revision)
    }

    async fn confirmed<T>(
        &self,
        context: &str,
        call: impl std::future::Future<Output = Result<T, QueryError>>,
    ) -> Result<T, StudioError> {
        call.await.map_err(|e| {
            self.report(context, &e);
            StudioError::from(e)
        })
    }

    pub async fn create_node(&self, label: &str, name: &str) -> Result<NodeId, StudioError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(StudioError::invalid_argument("node label must not be empty"));
        }
        let raw = self
            .confirmed(
                "Create node",
                self.service.create_node(label, name_properties(name)),
            )
            .await?;
        let node = self
            .normalizer
            .node(&raw)
            .ok_or(QueryError::Malformed(CoreError::UnresolvableId))?;
        let visual = self.projector.visual_node(&node);
        let id = visual.id.clone();
        self.apply_edit(EditKind::NodeCreated(id.clone()), |state| {
            state.with_node(visual)
        })?;
        Ok(id)
    }

    pub async fn rename_node(&self, id: &NodeId, name: &str) -> Result<(), StudioError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StudioError::invalid_argument("node name must not be empty"));
        }
        self.require_node(id)?;
        let raw = self
            .confirmed(
                "Rename node",
                self.service.update_node(id, name_properties(name)),
            )
            .await?;
        let label = self
            .normalizer
            .node(&raw)
            .map(|n| n.display_label())
            .unwrap_or_else(|| name.to_string());
        self.apply_edit(EditKind::NodeRenamed(id.clone()), |state| {
            state.renamed(id, label)
        })?;
        Ok(())
    }

    pub async fn delete_node(&self, id: &NodeId) -> Result<(), StudioError> {
        self.require_node(id)?;
        self.confirmed("Delete node", self.service.delete_node(id))
            .await?;
        self.apply_edit(EditKind::NodeDeleted(id.clone()), |state| {
            state.without_node(id)
        })?;
        Ok(())
    }

    pub async fn create_relation(
        &self,
        from: &NodeId,
        to: &NodeId,
        rel_type: &str,
    ) -> Result<EdgeId, StudioError> {
        let rel_type = rel_type.trim();
        if rel_type.is_empty() {
            return Err(StudioError::invalid_argument(
                "relationship type must not be empty",
            ));
        }
        if from == to {
            return Err(StudioError::invalid_argument(
                "a relationship needs two distinct nodes",
            ));
        }
        self.require_node(from)?;
        self.require_node(to)?;
        let raw = self
            .confirmed(
                "Create relationship",
                self.service
                    .create_relation(from, to, rel_type, Properties::new()),
            )
            .await?;
        let rel = self
            .normalizer
            .relationship(&raw)
            .ok_or(QueryError::Malformed(CoreError::UnresolvableId))?;
        let edge = GraphProjector::visual_edge(&rel);
        let id = edge.id.clone();
        self.apply_edit(EditKind::RelationCreated(id.clone()), |state| {
            state.with_edge(edge)
        })?;
        Ok(id)
    }

    pub async fn delete_relation(&self, id: &EdgeId) -> Result<(), StudioError> {
        if !self.state.lock().graph.graph().contains_edge(id) {
            return Err(EditError::UnknownEdge(id.clone()).into());
        }
        self.confirmed("Delete relationship", self.service.delete_relation(id))
            .await?;
        self.apply_edit(EditKind::RelationDeleted(id.clone()), |state| {
            state.without_edge(id)
        })?;
        Ok(())
    }

    /// Marks `id` mastered through the tutor backend and highlights the nodes
    /// it unlocks.
    pub async fn record_mastery(&self, id: &NodeId) -> Result<Vec<NodeId>, StudioError> {
        let tutor = self.require_tutor()?;
        let unlocked = match tutor.zpd_update(id).await {
            Ok(unlocked) => unlocked,
            Err(e) => {
                self.report("Mastery update", &e);
                return Err(e.into());
            }
        };
        let kind = EditKind::MasteryRecorded {
            focus: id.clone(),
            unlocked: unlocked.len(),
        };
        self.apply_edit(kind, |state| Ok(state.with_mastery(id, &unlocked)))?;
        Ok(unlocked)
    }

    // Rendering and interaction

    pub fn set_layout(&self, mode: LayoutMode) {
        self.state.lock().layout = mode;
    }

    /// Styled copy of the canvas for the rendering sink.
    pub fn frame(&self) -> RenderFrame {
        let state = self.state.lock();
        FrameBuilder::new(&self.settings.grouping)
            .layout(state.layout)
            .params(self.settings.layout.params)
            .build(state.graph.graph())
    }

    /// Arms link mode from `from`; the next node selection yields a draft.
    pub fn begin_link(&self, from: NodeId) {
        self.state.lock().interaction.begin_link(from);
    }

    pub fn cancel_link(&self) {
        self.state.lock().interaction.cancel_link();
    }

    /// Clears the selection, as a click on empty canvas does.
    pub fn clear_selection(&self) {
        self.state.lock().interaction.clear_selection();
        self.bus.publish(Event::SelectionChanged {
            node: None,
            edge: None,
        });
    }

    pub fn handle_graph_event(&self, event: GraphEvent) -> Interaction {
        let (interaction, node, edge) = {
            let mut state = self.state.lock();
            let interaction = state.interaction.dispatch(event);
            (
                interaction,
                state.interaction.selected_node.clone(),
                state.interaction.selected_edge.clone(),
            )
        };
        match &interaction {
            Interaction::NodeSelected(_) | Interaction::EdgeSelected(_) => {
                self.bus.publish(Event::SelectionChanged { node, edge });
            }
            Interaction::RelationDraft { from, to } => {
                self.bus.publish(Event::RelationDraftReady {
                    from: from.clone(),
                    to: to.clone(),
                });
            }
            Interaction::Ignored => {}
        }
        interaction
    }

    // Tutor

    pub fn evidence_for(&self, query: &str) -> Vec<EvidenceRecord> {
        let builder = self.settings.evidence.builder();
        builder.build(self.state.lock().graph.graph(), query)
    }

    /// Asks the tutor a free-text question, grounded in the evidence found
    /// around matching nodes on the canvas.
    pub async fn ask_tutor(&self, question: &str) -> Result<String, StudioError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(StudioError::invalid_argument("question must not be empty"));
        }
        let tutor = self.require_tutor()?;
        let evidence = self.evidence_for(question);
        debug!("Asking tutor with {} evidence records", evidence.len());
        tutor.ask(question, &evidence).await.map_err(|e| {
            self.report("Tutor request", &e);
            StudioError::from(e)
        })
    }

    /// Next exercise for the configured module, or `None` when the module
    /// has no questions left. Passing the question on screen as `current`
    /// asks for a different one.
    pub async fn next_exercise(
        &self,
        kind: Option<&str>,
        difficulty: Option<&str>,
        current: Option<&Question>,
    ) -> Result<Option<Question>, StudioError> {
        let tutor = self.require_tutor()?;
        let module = self.tutor_module()?;
        let request = QuestionRequest {
            kind: kind.map(str::to_string),
            difficulty: difficulty.map(str::to_string),
            exclude_id: current.map(|q| q.id.to_string()),
            ..QuestionRequest::for_module(module)
        };
        Ok(tutor.next_question(&request).await?)
    }

    /// Grades `selected` against the question's answer key and reports the
    /// result to the tutor.
    pub async fn submit_exercise(
        &self,
        question: &Question,
        selected: &str,
    ) -> Result<bool, StudioError> {
        let tutor = self.require_tutor()?;
        let correct = question.is_correct(selected);
        tutor
            .submit_answer(&question.id.to_string(), correct)
            .await?;
        Ok(correct)
    }

    pub async fn exercise_stats(&self) -> Result<QuestionStats, StudioError> {
        let tutor = self.require_tutor()?;
        let module = self.tutor_module()?;
        Ok(tutor.question_stats(&module).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryGraphService;

    const FIXTURE: &str = r#"{
        "nodes": [
            {"key": "frac", "labels": ["Concept"], "properties": {"name": "Fractions"}},
            {"key": "cmp", "labels": ["Skill"], "properties": {"name": "Compare fractions"}}
        ],
        "relationships": [
            {"from": "cmp", "to": "frac", "type": "REQUIRES"}
        ]
    }"#;

    fn controller() -> StudioController {
        let service = MemoryGraphService::from_json(FIXTURE).unwrap();
        StudioController::new(Arc::new(service), StudioSettings::default())
    }

    #[tokio::test]
    async fn test_catalogs() {
        let controller = controller();
        assert_eq!(
            controller.catalog(CatalogKind::Labels).await.unwrap(),
            vec!["Concept".to_string(), "Skill".to_string()]
        );
        assert_eq!(
            controller
                .catalog(CatalogKind::RelationshipTypes)
                .await
                .unwrap(),
            vec!["REQUIRES".to_string()]
        );
    }

    #[tokio::test]
    async fn test_search_nodes_leaves_canvas_alone() {
        let controller = controller();
        let nodes = controller.search_nodes("frac", None).await.unwrap();
        assert_eq!(nodes.len(), 2);
        assert!(controller.graph().is_empty());
        assert_eq!(controller.revision(), 0);
    }

    #[tokio::test]
    async fn test_search_paths_validates_arguments() {
        let controller = controller();
        assert!(matches!(
            controller.search_paths("  ", None).await,
            Err(StudioError::InvalidArgument(_))
        ));
        assert!(matches!(
            controller.search_paths("frac", Some(0)).await,
            Err(StudioError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_skill_plan_lists_linked_concepts() {
        let controller = controller();
        let plan = controller.skill_plan(&NodeId::from("mem:2")).await.unwrap();
        assert_eq!(plan.concepts.len(), 1);
        assert_eq!(plan.concepts[0].name, "Fractions");
        assert!(plan.tasks.is_empty());
        assert_eq!(plan.summary(), "Learn first: Fractions");

        let guide = controller
            .competency_guide(&NodeId::from("mem:2"))
            .await
            .unwrap();
        assert!(guide.is_empty());

        assert!(matches!(
            controller.skill_plan(&NodeId::from("mem:42")).await,
            Err(StudioError::Query(QueryError::NotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_tutor_required() {
        let controller = controller();
        assert!(matches!(
            controller.ask_tutor("what is a fraction?").await,
            Err(StudioError::NoTutor)
        ));
        assert!(matches!(
            controller.record_mastery(&NodeId::from("mem:1")).await,
            Err(StudioError::NoTutor)
        ));
    }

    #[tokio::test]
    async fn test_frame_follows_layout() {
        let controller = controller();
        controller.load_overview().await.unwrap();
        controller.set_layout(LayoutMode::Radial);
        let frame = controller.frame();
        assert_eq!(frame.nodes.len(), 2);
        assert!(frame.nodes.iter().all(|n| n.x.is_some() && n.y.is_some()));
        assert!(!frame.options.physics);
        // The canvas itself carries no positions.
        assert!(controller.graph().nodes.iter().all(|n| n.x.is_none()));
    }
}
