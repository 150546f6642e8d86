//! The reorderable list of selected frames.
//!
//! Rows are native HTML5 drag sources. Dragging only reports the source
//! and target indices; the controller performs the move and the list
//! re-renders from its new order.

use dioxus::prelude::*;
use dioxus_free_icons::Icon;
use dioxus_free_icons::icons::ld_icons::LdGripVertical;

use framegif_core::FrameDescriptor;

/// Props for the [`FrameListView`] component.
#[derive(Props, Clone, PartialEq)]
pub struct FrameListViewProps {
    /// Frames in export order.
    frames: Vec<FrameDescriptor>,
    /// Shown instead of rows when `frames` is empty.
    #[props(!optional)]
    placeholder: Option<&'static str>,
    /// Row currently being dragged.
    #[props(!optional)]
    drag_source: Option<usize>,
    /// A conversion is running; rows cannot be dragged.
    locked: bool,
    on_drag_start: EventHandler<usize>,
    /// Fired with the index of the row the drag was released on.
    on_drop: EventHandler<usize>,
    on_drag_end: EventHandler<()>,
}

/// Vertical list of frame rows with drag-to-reorder.
#[component]
pub fn FrameListView(props: FrameListViewProps) -> Element {
    let mut drag_over = use_signal(|| Option::<usize>::None);

    if let Some(text) = props.placeholder.filter(|_| props.frames.is_empty()) {
        return rsx! {
            div { class: "frames",
                div { class: "frame-item",
                    div { class: "frame-message", "{text}" }
                }
            }
        };
    }

    rsx! {
        div { class: "frames",
            for (index, frame) in props.frames.iter().enumerate() {
                div {
                    key: "{frame.id}",
                    class: row_class(index, props.drag_source, drag_over(), props.locked),
                    draggable: if props.locked { "false" } else { "true" },
                    ondragstart: move |_| props.on_drag_start.call(index),
                    ondragover: move |evt: DragEvent| {
                        if props.locked {
                            return;
                        }
                        evt.prevent_default();
                        drag_over.set(Some(index));
                    },
                    ondragleave: move |_| drag_over.set(None),
                    ondrop: move |evt: DragEvent| {
                        evt.prevent_default();
                        drag_over.set(None);
                        props.on_drop.call(index);
                    },
                    ondragend: move |_| {
                        drag_over.set(None);
                        props.on_drag_end.call(());
                    },

                    div { class: "frame-info",
                        div { class: "frame-name", title: "{frame.name}", "{frame.name}" }
                        div { class: "frame-dimensions", title: "Frame dimensions",
                            "{frame.width} × {frame.height}"
                        }
                    }
                    div { class: "frame-drag", title: "Drag to reorder",
                        Icon { width: 14, height: 14, icon: LdGripVertical }
                    }
                }
            }
        }
    }
}

fn row_class(index: usize, dragging: Option<usize>, over: Option<usize>, locked: bool) -> String {
    let mut class = String::from("frame-item");
    if locked {
        class.push_str(" locked");
        return class;
    }
    if dragging == Some(index) {
        class.push_str(" dragging");
    }
    if over == Some(index) && dragging != Some(index) {
        class.push_str(" drag-over");
    }
    class
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_classes_track_drag_state() {
        assert_eq!(row_class(0, None, None, false), "frame-item");
        assert_eq!(row_class(1, Some(1), Some(1), false), "frame-item dragging");
        assert_eq!(row_class(2, Some(0), Some(2), false), "frame-item drag-over");
    }

    #[test]
    fn locked_rows_show_no_drag_state() {
        assert_eq!(row_class(2, Some(0), Some(2), true), "frame-item locked");
    }
}
