use pulsebar_proto::config::TrafficModuleConfig;

use crate::render::{Icon, RenderInstruction, StyledSpan, TextSize};

use super::rate::{TrafficRates, format_rate};

/// Map computed rates and configuration into a render instruction.
///
/// Pure: identical inputs produce identical instructions. `last_text` is the
/// text of the previously emitted instruction and drives idle blanking.
pub fn present(
    rates: &TrafficRates,
    config: &TrafficModuleConfig,
    last_text: Option<&str>,
) -> RenderInstruction {
    if rates.up.is_none() && rates.down.is_none() {
        return RenderInstruction::hidden();
    }

    let mut text = String::new();
    let mut spans = Vec::new();

    if let Some(up) = &rates.up {
        let start = text.len();
        text.push_str(&format_rate(up, config.unit));
        if config.show_text {
            text.push_str(" U");
        }
        spans.push(StyledSpan::colored(start..text.len(), config.color_up));
    }

    let text_size = if rates.up.is_some() && rates.down.is_some() {
        text.push('\n');
        TextSize::Multi
    } else {
        TextSize::Single
    };

    if let Some(down) = &rates.down {
        let start = text.len();
        text.push_str(&format_rate(down, config.unit));
        if config.show_text {
            text.push_str(" D");
        }
        spans.push(StyledSpan::colored(start..text.len(), config.color_down));
    }

    let icon = config.show_icon.then(|| {
        match (rates.up.is_some(), rates.down.is_some()) {
            (true, true) => Icon::TrafficUpDown,
            (false, true) => Icon::TrafficDown,
            _ => Icon::TrafficUp,
        }
    });

    // unchanged text plus hide_when_idle means the shell blanks the display
    let visible = !(config.hide_when_idle && last_text == Some(text.as_str()));

    RenderInstruction {
        text,
        spans,
        color: config.color_icon,
        text_size,
        icon,
        icon_tint: config.color_icon,
        visible,
    }
}
