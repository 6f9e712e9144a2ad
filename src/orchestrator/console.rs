//! 终端宿主 - 编排层
//!
//! 把 stdin 的每一行翻译成宿主事件或控制器指令，代替图形界面。
//!
//! ```text
//! activity | move | scroll | click | touch     在场交互
//! blur | hidden | visible                      焦点变化
//! submit | confirm | cancel                    手动交卷
//! edit <题目ID> mnn <文本>
//! edit <题目ID> trade <逗号分隔>
//! edit <题目ID> type <类型|->
//! edit <题目ID> form +tablets / -tablets
//! edit <题目ID> ind +<适应症> / elim +<途径>
//! edit <题目ID> dosage <剂型> +<剂量>
//! edit <题目ID> dose <类别> <数值>
//! edit <题目ID> extra <类别> +<名称>
//! edit <题目ID> extraval <类别> <名称> <数值>
//! edit <题目ID> half <起> <止>
//! ```

use crate::services::{HostEvent, Interaction, SelectionEdit};
use crate::workflow::SessionCommand;

/// 一行输入的解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleInput {
    Host(HostEvent),
    Command(SessionCommand),
    Help,
}

pub const HELP_TEXT: &str = "activity|move|scroll|click|touch, blur|hidden|visible, \
submit|confirm|cancel, edit <id> <mnn|trade|type|form|ind|elim|dosage|dose|extra|extraval|half> ...";

/// 解析一行输入，无法识别时返回 None
pub fn parse_line(line: &str) -> Option<ConsoleInput> {
    let line = line.trim();
    let (head, rest) = split_word(line);

    let input = match head {
        "activity" | "key" => ConsoleInput::Host(HostEvent::Presence(Interaction::KeyPress)),
        "move" => ConsoleInput::Host(HostEvent::Presence(Interaction::PointerMove)),
        "scroll" => ConsoleInput::Host(HostEvent::Presence(Interaction::Scroll)),
        "click" => ConsoleInput::Host(HostEvent::Presence(Interaction::Click)),
        "touch" => ConsoleInput::Host(HostEvent::Presence(Interaction::Touch)),
        "blur" => ConsoleInput::Host(HostEvent::WindowBlur),
        "hidden" => ConsoleInput::Host(HostEvent::VisibilityChanged { visible: false }),
        "visible" => ConsoleInput::Host(HostEvent::VisibilityChanged { visible: true }),
        "submit" => ConsoleInput::Command(SessionCommand::RequestSubmit),
        "confirm" | "yes" => ConsoleInput::Command(SessionCommand::ConfirmSubmit),
        "cancel" | "no" => ConsoleInput::Command(SessionCommand::CancelSubmit),
        "help" | "?" => ConsoleInput::Help,
        "edit" => {
            let (item_id, rest) = split_word(rest);
            if item_id.is_empty() {
                return None;
            }
            ConsoleInput::Command(SessionCommand::Edit {
                item_id: item_id.to_string(),
                edit: parse_edit(rest)?,
            })
        }
        _ => return None,
    };
    Some(input)
}

fn parse_edit(input: &str) -> Option<SelectionEdit> {
    let (field, rest) = split_word(input);
    let edit = match field {
        "mnn" => SelectionEdit::SetMnn(rest.to_string()),
        "trade" => SelectionEdit::SetTradeNames(rest.to_string()),
        "type" => SelectionEdit::SetDictatedType(optional(rest).map(str::to_string)),
        "form" => {
            let (checked, form) = signed(rest)?;
            SelectionEdit::ToggleForm {
                form: form.to_string(),
                checked,
            }
        }
        "ind" => {
            let (checked, value) = signed(rest)?;
            SelectionEdit::ToggleIndication {
                value: value.to_string(),
                checked,
            }
        }
        "elim" => {
            let (checked, value) = signed(rest)?;
            SelectionEdit::ToggleElimination {
                value: value.to_string(),
                checked,
            }
        }
        "dosage" => {
            let (form, option) = split_word(rest);
            let (checked, option) = signed(option)?;
            SelectionEdit::ToggleDosage {
                form: form.to_string(),
                option: option.to_string(),
                checked,
            }
        }
        "dose" => {
            let (kind, raw) = split_word(rest);
            SelectionEdit::SetDoseMain {
                kind: non_empty(kind)?.to_string(),
                raw: raw.to_string(),
            }
        }
        "extra" => {
            let (kind, label) = split_word(rest);
            let (checked, label) = signed(label)?;
            SelectionEdit::ToggleDoseExtra {
                kind: non_empty(kind)?.to_string(),
                label: label.to_string(),
                checked,
            }
        }
        "extraval" => {
            let (kind, rest) = split_word(rest);
            let (label, raw) = split_word(rest);
            SelectionEdit::SetDoseExtraValue {
                kind: non_empty(kind)?.to_string(),
                label: non_empty(label)?.to_string(),
                raw: raw.to_string(),
            }
        }
        "half" => {
            let (from, to) = split_word(rest);
            let raw = |s: &str| optional(s).unwrap_or_default().to_string();
            SelectionEdit::SetHalfLife {
                from: raw(from),
                to: raw(to),
            }
        }
        _ => return None,
    };
    Some(edit)
}

fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (input, ""),
    }
}

fn signed(input: &str) -> Option<(bool, &str)> {
    let input = input.trim();
    let (checked, value) = if let Some(value) = input.strip_prefix('+') {
        (true, value)
    } else if let Some(value) = input.strip_prefix('-') {
        (false, value)
    } else {
        return None;
    };
    non_empty(value.trim()).map(|v| (checked, v))
}

fn non_empty(input: &str) -> Option<&str> {
    (!input.is_empty()).then_some(input)
}

// "-" 表示清空
fn optional(input: &str) -> Option<&str> {
    let input = input.trim();
    (!input.is_empty() && input != "-").then_some(input)
}
