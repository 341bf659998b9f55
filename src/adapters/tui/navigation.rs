use crate::domain::VehicleNumber;

#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    AddComplaint,
    ComplaintList,
    ComplaintDetails { number: VehicleNumber },
}

impl Route {
    pub fn title(&self) -> &'static str {
        match self {
            Route::AddComplaint => "Submit a Complaint",
            Route::ComplaintList => "Complaint History",
            Route::ComplaintDetails { .. } => "Complaint Details",
        }
    }
}

/// Stack of visited routes; the root is never popped.
#[derive(Debug)]
pub struct Navigator {
    stack: Vec<Route>,
}

impl Navigator {
    pub fn new(initial: Route) -> Self {
        Self {
            stack: vec![initial],
        }
    }

    pub fn current(&self) -> &Route {
        // The stack always holds the root route
        &self.stack[self.stack.len() - 1]
    }

    pub fn navigate(&mut self, route: Route) {
        tracing::debug!("Navigate to {:?}", route);
        self.stack.push(route);
    }

    /// Pops the current route. Returns false at the root.
    pub fn go_back(&mut self) -> bool {
        if self.stack.len() <= 1 {
            return false;
        }
        self.stack.pop();
        true
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}
