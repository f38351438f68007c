use serde::Serialize;

use crate::controller::view::{DrugCard, Panel, SearchView};
use crate::entities::drug::SearchForm;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PanelView {
    pub visible: bool,
    pub count_label: String,
    pub cards: Vec<DrugCard>,
}

/// In-memory search page: the state a browser would hold in its DOM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    pub form: SearchForm,
    pub loading: bool,
    pub submit_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub main: PanelView,
    pub identical: PanelView,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            form: SearchForm::default(),
            loading: false,
            submit_enabled: true,
            error: None,
            main: PanelView::default(),
            identical: PanelView::default(),
        }
    }
}

impl Page {
    pub fn panel(&self, panel: Panel) -> &PanelView {
        match panel {
            Panel::Main => &self.main,
            Panel::Identical => &self.identical,
        }
    }

    fn panel_mut(&mut self, panel: Panel) -> &mut PanelView {
        match panel {
            Panel::Main => &mut self.main,
            Panel::Identical => &mut self.identical,
        }
    }

    pub fn visible_panels(&self) -> Vec<Panel> {
        Panel::ALL
            .into_iter()
            .filter(|p| self.panel(*p).visible)
            .collect()
    }
}

impl SearchView for Page {
    fn set_form(&mut self, form: &SearchForm) {
        self.form = form.clone();
    }

    fn clear_form(&mut self) {
        self.form = SearchForm::default();
    }

    fn set_loading(&mut self, visible: bool) {
        self.loading = visible;
    }

    fn set_submit_enabled(&mut self, enabled: bool) {
        self.submit_enabled = enabled;
    }

    fn show_error(&mut self, message: &str) {
        self.error = Some(message.to_string());
    }

    fn hide_error(&mut self) {
        self.error = None;
    }

    fn show_panel(&mut self, panel: Panel, cards: Vec<DrugCard>, count_label: String) {
        let view = self.panel_mut(panel);
        view.cards = cards;
        view.count_label = count_label;
        view.visible = true;
    }

    fn hide_panel(&mut self, panel: Panel) {
        *self.panel_mut(panel) = PanelView::default();
    }
}
