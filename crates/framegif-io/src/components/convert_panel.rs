//! Format selector, frame delay input, and the refresh/convert buttons.

use dioxus::prelude::*;
use dioxus_free_icons::Icon;
use dioxus_free_icons::icons::ld_icons::LdRefreshCw;
use log::warn;

use framegif_core::{AnimationFormat, UiConfig};

/// Props for the [`ConvertPanel`] component.
#[derive(Props, Clone, PartialEq)]
pub struct ConvertPanelProps {
    format: AnimationFormat,
    /// Milliseconds per frame.
    frame_delay: u32,
    /// Enables the convert button.
    can_convert: bool,
    /// A conversion is running: swaps the button label and disables
    /// every input.
    busy: bool,
    on_format_change: EventHandler<AnimationFormat>,
    on_delay_change: EventHandler<u32>,
    on_refresh: EventHandler<()>,
    on_convert: EventHandler<()>,
}

#[component]
pub fn ConvertPanel(props: ConvertPanelProps) -> Element {
    let convert_label = if props.busy {
        "Converting..."
    } else {
        "Convert to Animation"
    };
    let selected = props.format;

    rsx! {
        div { class: "controls",
            div { class: "control-row",
                label { r#for: "format", "Format" }
                select {
                    id: "format",
                    disabled: props.busy,
                    value: "{selected}",
                    onchange: move |e| match AnimationFormat::from_name(&e.value()) {
                        Some(format) => props.on_format_change.call(format),
                        None => warn!("unknown animation format {:?}", e.value()),
                    },
                    for format in AnimationFormat::ALL {
                        option {
                            value: "{format}",
                            selected: format == selected,
                            "{format.label()}"
                        }
                    }
                }
            }

            div { class: "control-row",
                label { r#for: "frame-delay", "Frame delay (ms)" }
                input {
                    r#type: "number",
                    id: "frame-delay",
                    disabled: props.busy,
                    min: "{UiConfig::MIN_FRAME_DELAY_MS}",
                    max: "{UiConfig::MAX_FRAME_DELAY_MS}",
                    value: "{props.frame_delay}",
                    onchange: move |e| match e.value().trim().parse::<u32>() {
                        Ok(ms) => props.on_delay_change.call(ms),
                        Err(err) => warn!("frame delay parse failure: {err} from {:?}", e.value()),
                    },
                }
            }

            div { class: "button-row",
                button {
                    class: "secondary",
                    title: "Refresh frame list",
                    disabled: props.busy,
                    onclick: move |_| props.on_refresh.call(()),
                    Icon { width: 14, height: 14, icon: LdRefreshCw }
                    "Refresh"
                }
                button {
                    class: "primary",
                    disabled: !props.can_convert,
                    onclick: move |_| props.on_convert.call(()),
                    "{convert_label}"
                }
            }
        }
    }
}
