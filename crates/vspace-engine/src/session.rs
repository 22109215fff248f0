use vspace_core::{EngineError, ErrorInfo, Point, VariableId};
use vspace_doe::{DoeMethod, DoeRequest, DoeResult};
use vspace_opt::{ObjectiveSpec, OptimizeRequest};

/// Caller-held selection state: the chosen variables and the last design.
///
/// Engines never see a `Session`; it only builds requests.
#[derive(Debug, Clone, Default)]
pub struct Session {
    selected: Vec<VariableId>,
    last_doe: Option<DoeResult>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or removes a variable, keeping selection order.
    pub fn toggle(&mut self, id: VariableId) {
        match self.selected.iter().position(|s| *s == id) {
            Some(index) => {
                self.selected.remove(index);
            }
            None => self.selected.push(id),
        }
    }

    pub fn select_all(&mut self, ids: impl IntoIterator<Item = VariableId>) {
        self.selected.clear();
        for id in ids {
            if !self.selected.contains(&id) {
                self.selected.push(id);
            }
        }
    }

    pub fn selected(&self) -> &[VariableId] {
        &self.selected
    }

    pub fn remember_doe(&mut self, result: DoeResult) {
        self.last_doe = Some(result);
    }

    pub fn last_doe(&self) -> Option<&DoeResult> {
        self.last_doe.as_ref()
    }

    pub fn doe_request(&self, n_points: usize, method: DoeMethod) -> DoeRequest {
        DoeRequest::new(self.selected.clone(), n_points, method)
    }

    /// Builds an optimize request over the selection. With `warm_start`, the
    /// last design's points (projected onto the selection) become the
    /// initial points.
    pub fn optimize_request(
        &self,
        n_iter: usize,
        objective: ObjectiveSpec,
        max_initial_points: usize,
        warm_start: bool,
    ) -> Result<OptimizeRequest, EngineError> {
        let initial_points = match (&self.last_doe, warm_start) {
            (Some(doe), true) => self.project(doe)?,
            _ => Vec::new(),
        };
        Ok(OptimizeRequest::new(self.selected.clone(), n_iter, objective)
            .with_initial_points(initial_points, max_initial_points))
    }

    fn project(&self, doe: &DoeResult) -> Result<Vec<Point>, EngineError> {
        let missing: Vec<String> = self
            .selected
            .iter()
            .filter(|id| !doe.variable_ids.contains(*id))
            .map(|id| id.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(EngineError::Validation(
                ErrorInfo::new(
                    "session.warm_start",
                    "the last design does not cover every selected variable",
                )
                .with_context("missing_variable_ids", missing.join(","))
                .with_hint("generate a new design over the current selection"),
            ));
        }
        Ok(doe
            .points
            .iter()
            .map(|point| {
                point
                    .iter()
                    .filter(|(id, _)| self.selected.contains(*id))
                    .map(|(id, v)| (*id, *v))
                    .collect()
            })
            .collect())
    }
}
