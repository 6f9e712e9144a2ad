//! 答卷组装服务 - 业务能力层
//!
//! 界面层只写入每道题的临时选择（`ItemSelection`），
//! 交卷时由 `AnswerAssembler` 一次性转换成 `AnswerRecord`。

use std::collections::BTreeMap;

use crate::error::AppResult;
use crate::models::{AnswerRecord, DoseAnswer, NumericRange, TicketItem};
use crate::services::dosage::FormDosageSelection;

/// 附加剂量输入：勾选状态和原始文本分开保存
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtraInput {
    pub checked: bool,
    pub raw: String,
}

/// 一类剂量的原始输入
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DoseInput {
    pub main: String,
    pub extras: BTreeMap<String, ExtraInput>,
}

/// 对单道题选择状态的一次编辑
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionEdit {
    SetDictatedType(Option<String>),
    SetMnn(String),
    SetTradeNames(String),
    ToggleForm { form: String, checked: bool },
    ToggleIndication { value: String, checked: bool },
    ToggleElimination { value: String, checked: bool },
    ToggleDosage { form: String, option: String, checked: bool },
    SetDoseMain { kind: String, raw: String },
    ToggleDoseExtra { kind: String, label: String, checked: bool },
    SetDoseExtraValue { kind: String, label: String, raw: String },
    SetHalfLife { from: String, to: String },
}

/// 一道题的临时选择状态
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemSelection {
    pub dictated_type: Option<String>,
    pub mnn: String,
    pub trade_names: String,
    /// 按勾选顺序保存，不重复
    pub forms: Vec<String>,
    pub indications: Vec<String>,
    pub elimination: Vec<String>,
    pub form_dosages: FormDosageSelection,
    pub doses: BTreeMap<String, DoseInput>,
    pub half_life_from: String,
    pub half_life_to: String,
}

impl ItemSelection {
    pub fn apply(&mut self, edit: SelectionEdit) -> AppResult<()> {
        match edit {
            SelectionEdit::SetDictatedType(kind) => {
                self.dictated_type = kind.filter(|k| !k.trim().is_empty());
            }
            SelectionEdit::SetMnn(text) => self.mnn = text,
            SelectionEdit::SetTradeNames(text) => self.trade_names = text,
            SelectionEdit::ToggleForm { form, checked } => {
                toggle_value(&mut self.forms, form, checked);
                self.form_dosages.reconcile(&self.forms);
            }
            SelectionEdit::ToggleIndication { value, checked } => {
                toggle_value(&mut self.indications, value, checked);
            }
            SelectionEdit::ToggleElimination { value, checked } => {
                toggle_value(&mut self.elimination, value, checked);
            }
            SelectionEdit::ToggleDosage {
                form,
                option,
                checked,
            } => self.form_dosages.toggle(&form, &option, checked)?,
            SelectionEdit::SetDoseMain { kind, raw } => {
                self.doses.entry(kind).or_default().main = raw;
            }
            SelectionEdit::ToggleDoseExtra {
                kind,
                label,
                checked,
            } => {
                let dose = self.doses.entry(kind).or_default();
                let extra = dose.extras.entry(label).or_default();
                extra.checked = checked;
                // 取消勾选即丢弃已填数值
                if !checked {
                    extra.raw.clear();
                }
            }
            SelectionEdit::SetDoseExtraValue { kind, label, raw } => {
                let dose = self.doses.entry(kind).or_default();
                dose.extras.entry(label).or_default().raw = raw;
            }
            SelectionEdit::SetHalfLife { from, to } => {
                self.half_life_from = from;
                self.half_life_to = to;
            }
        }
        Ok(())
    }

    /// 转换成标准化答案，未作答字段保持 null / 空
    pub fn to_record(&self) -> AnswerRecord {
        let doses = self
            .doses
            .iter()
            .map(|(kind, input)| {
                let extras = input
                    .extras
                    .iter()
                    .filter(|(_, extra)| extra.checked)
                    .map(|(label, extra)| (label.clone(), parse_int(&extra.raw)))
                    .collect();
                (
                    kind.clone(),
                    DoseAnswer {
                        main: parse_int(&input.main),
                        extras,
                    },
                )
            })
            .collect();

        AnswerRecord {
            dictated_type: self.dictated_type.clone(),
            mnn: self.mnn.trim().to_string(),
            trade_names: split_trade_names(&self.trade_names),
            forms: self.forms.clone(),
            indications: self.indications.clone(),
            form_dosages: self.form_dosages.to_map(),
            doses,
            half_life: NumericRange {
                from: parse_int(&self.half_life_from),
                to: parse_int(&self.half_life_to),
            },
            elimination: self.elimination.clone(),
        }
    }
}

fn toggle_value(values: &mut Vec<String>, value: String, checked: bool) {
    let present = values.iter().any(|v| *v == value);
    match (checked, present) {
        (true, false) => values.push(value),
        (false, true) => values.retain(|v| *v != value),
        _ => {}
    }
}

/// 整场考试的选择状态，按题目 ID 索引
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    items: BTreeMap<String, ItemSelection>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn edit(&mut self, item_id: &str, edit: SelectionEdit) -> AppResult<()> {
        self.items.entry(item_id.to_string()).or_default().apply(edit)
    }

    pub fn get(&self, item_id: &str) -> Option<&ItemSelection> {
        self.items.get(item_id)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// 答卷组装器
pub struct AnswerAssembler;

impl AnswerAssembler {
    /// 每道题恰好一条记录，未触碰的题目输出空记录
    pub fn assemble(
        items: &[TicketItem],
        selections: &SelectionState,
    ) -> BTreeMap<String, AnswerRecord> {
        items
            .iter()
            .map(|item| {
                let record = selections
                    .get(&item.item_id)
                    .map(ItemSelection::to_record)
                    .unwrap_or_default();
                (item.item_id.clone(), record)
            })
            .collect()
    }
}

/// 去空白后按整数解析，空串或非法输入为 None（绝不为 0）
pub fn parse_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<i64>().ok()
}

/// 逗号分隔的商品名，逐项去空白并丢弃空项
pub fn split_trade_names(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket() -> Vec<TicketItem> {
        vec![
            TicketItem::new("11", "Амитриптилин"),
            TicketItem::new("42", "Галоперидол"),
        ]
    }

    #[test]
    fn test_parse_int_never_defaults_to_zero() {
        assert_eq!(parse_int(" 25 "), Some(25));
        assert_eq!(parse_int("-3"), Some(-3));
        assert_eq!(parse_int(""), None);
        assert_eq!(parse_int("   "), None);
        assert_eq!(parse_int("12.5"), None);
        assert_eq!(parse_int("abc"), None);
    }

    #[test]
    fn test_split_trade_names() {
        assert_eq!(
            split_trade_names(" Саролтен , ,Триптизол,"),
            vec!["Саролтен".to_string(), "Триптизол".to_string()]
        );
        assert!(split_trade_names("  ").is_empty());
    }

    #[test]
    fn test_untouched_item_gets_empty_record() {
        let mut state = SelectionState::new();
        state
            .edit("11", SelectionEdit::SetMnn("  Amitriptyline ".into()))
            .unwrap();

        let answers = AnswerAssembler::assemble(&ticket(), &state);
        assert_eq!(answers.len(), 2);
        assert_eq!(answers["11"].mnn, "Amitriptyline");
        assert_eq!(answers["42"], AnswerRecord::default());
        assert!(answers["42"].dictated_type.is_none());
        assert_eq!(answers["42"].half_life, NumericRange::default());
    }

    #[test]
    fn test_selections_for_unknown_items_are_not_emitted() {
        let mut state = SelectionState::new();
        state
            .edit("999", SelectionEdit::SetMnn("stray".into()))
            .unwrap();
        let answers = AnswerAssembler::assemble(&ticket(), &state);
        assert!(!answers.contains_key("999"));
    }

    #[test]
    fn test_dose_extras_only_when_checked() {
        let mut item = ItemSelection::default();
        item.apply(SelectionEdit::SetDoseMain {
            kind: "daily".into(),
            raw: "150".into(),
        })
        .unwrap();
        item.apply(SelectionEdit::SetDoseExtraValue {
            kind: "daily".into(),
            label: "max".into(),
            raw: "300".into(),
        })
        .unwrap();
        item.apply(SelectionEdit::SetDoseExtraValue {
            kind: "daily".into(),
            label: "elderly".into(),
            raw: "oops".into(),
        })
        .unwrap();
        item.apply(SelectionEdit::ToggleDoseExtra {
            kind: "daily".into(),
            label: "elderly".into(),
            checked: true,
        })
        .unwrap();

        let record = item.to_record();
        let daily = &record.doses["daily"];
        assert_eq!(daily.main, Some(150));
        assert_eq!(daily.extras.len(), 1);
        assert_eq!(daily.extras["elderly"], None);
    }

    #[test]
    fn test_unchecked_extra_discards_its_value() {
        let mut item = ItemSelection::default();
        let toggle = |checked| SelectionEdit::ToggleDoseExtra {
            kind: "daily".into(),
            label: "max".into(),
            checked,
        };
        item.apply(toggle(true)).unwrap();
        item.apply(SelectionEdit::SetDoseExtraValue {
            kind: "daily".into(),
            label: "max".into(),
            raw: "300".into(),
        })
        .unwrap();
        assert_eq!(item.to_record().doses["daily"].extras["max"], Some(300));

        item.apply(toggle(false)).unwrap();
        assert!(item.to_record().doses["daily"].extras.is_empty());

        item.apply(toggle(true)).unwrap();
        assert_eq!(item.to_record().doses["daily"].extras["max"], None);
    }

    #[test]
    fn test_form_dosages_follow_selected_forms() {
        let mut item = ItemSelection::default();
        let toggle_form = |form: &str, checked| SelectionEdit::ToggleForm {
            form: form.into(),
            checked,
        };
        item.apply(toggle_form("ampoules", true)).unwrap();
        item.apply(toggle_form("tablets", true)).unwrap();
        for option in ["25 mg – 2 ml", "50 mg – 1 ml"] {
            item.apply(SelectionEdit::ToggleDosage {
                form: "ampoules".into(),
                option: option.into(),
                checked: true,
            })
            .unwrap();
        }
        item.apply(toggle_form("ampoules", false)).unwrap();
        item.apply(toggle_form("ampoules", true)).unwrap();

        let record = item.to_record();
        assert_eq!(record.forms, vec!["tablets".to_string(), "ampoules".to_string()]);
        assert!(record.form_dosages["ampoules"].is_empty());
        assert_eq!(
            record.form_dosages.keys().collect::<Vec<_>>(),
            vec!["ampoules", "tablets"]
        );
    }

    #[test]
    fn test_half_life_and_dictated_type() {
        let mut item = ItemSelection::default();
        item.apply(SelectionEdit::SetHalfLife {
            from: "10".into(),
            to: " ".into(),
        })
        .unwrap();
        item.apply(SelectionEdit::SetDictatedType(Some("mnn".into())))
            .unwrap();
        item.apply(SelectionEdit::SetDictatedType(Some(" ".into())))
            .unwrap();

        let record = item.to_record();
        assert_eq!(record.half_life.from, Some(10));
        assert_eq!(record.half_life.to, None);
        assert!(record.dictated_type.is_none());
    }

    #[test]
    fn test_toggle_value_keeps_order_without_duplicates() {
        let mut item = ItemSelection::default();
        for (value, checked) in [("renal", true), ("hepatic", true), ("renal", true)] {
            item.apply(SelectionEdit::ToggleElimination {
                value: value.into(),
                checked,
            })
            .unwrap();
        }
        assert_eq!(item.elimination, vec!["renal", "hepatic"]);
    }
}
