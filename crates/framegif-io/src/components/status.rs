//! Status line and progress bar.

use dioxus::prelude::*;

use framegif_core::Status;

/// Props for the [`StatusBar`] component.
#[derive(Props, Clone, PartialEq)]
pub struct StatusBarProps {
    status: Status,
    /// Percent, `0..=100`.
    progress: u8,
}

#[component]
pub fn StatusBar(props: StatusBarProps) -> Element {
    let class = if props.status.is_error {
        "status error"
    } else {
        "status"
    };
    let width = props.progress.min(100);

    rsx! {
        div { class: "progress",
            div { class: "progress-bar", style: "width: {width}%" }
        }
        div { class: "{class}", role: "status", "{props.status.text}" }
    }
}
