use serde::Serialize;

/// One line of `adb devices -l` in the `device` state
#[derive(Debug, PartialEq, Serialize, Clone)]
pub struct Device {
    pub name: String,
    pub transport_id: Option<String>,
    pub model: Option<String>,
}

impl Device {
    pub fn label(&self) -> String {
        match (&self.model, &self.transport_id) {
            (Some(model), Some(tid)) => format!("{} ({model}, transport {tid})", self.name),
            (Some(model), None) => format!("{} ({model})", self.name),
            (None, Some(tid)) => format!("{} (transport {tid})", self.name),
            (None, None) => self.name.clone(),
        }
    }
}
