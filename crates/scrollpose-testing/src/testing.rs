use scrollpose_core::{location_key, Composition, Key, RuntimeHandle};

/// Headless harness for exercising compositions in tests.
///
/// `ComposeTestRule` keeps the installed content for reuse across
/// recompositions and drives pending work to quiescence without a
/// windowing backend: state writes mark scopes invalid, and
/// [`ComposeTestRule::pump_until_idle`] renders until nothing remains
/// scheduled.
pub struct ComposeTestRule {
    composition: Composition,
    content: Option<Box<dyn FnMut()>>, // Stored user content for reuse across recompositions.
    root_key: Key,
}

impl ComposeTestRule {
    pub fn new() -> Self {
        Self {
            composition: Composition::new(),
            content: None,
            root_key: location_key(file!(), line!(), column!()),
        }
    }

    /// Install the provided content into the composition and perform an
    /// initial render.
    pub fn set_content(&mut self, content: impl FnMut() + 'static) {
        self.content = Some(Box::new(content));
        self.render();
    }

    /// Force a recomposition using the currently installed content.
    pub fn recomposition(&mut self) {
        self.render();
    }

    /// Drive the composition until there are no pending renders or
    /// invalidated scopes remaining.
    pub fn pump_until_idle(&mut self) {
        let mut passes = 0;
        while self.composition.should_render() {
            passes += 1;
            if passes > 100 {
                panic!("pump_until_idle looped too many times!");
            }
            self.render();
        }
    }

    /// Access the runtime driving this rule. Useful for constructing shared
    /// state objects outside the composition.
    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.composition.runtime_handle()
    }

    fn render(&mut self) {
        let content = self
            .content
            .as_mut()
            .expect("set_content must run before rendering");
        self.composition.render(self.root_key, content);
    }
}

impl Default for ComposeTestRule {
    fn default() -> Self {
        Self::new()
    }
}
