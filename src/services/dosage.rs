//! 剂量词表服务 - 业务能力层
//!
//! 每种剂型属于且仅属于一个类别，类别决定可选的剂量列表。
//! 未知剂型一律使用"干扰项"列表。

use std::collections::{BTreeMap, BTreeSet};

use phf::phf_map;

use crate::error::{AppResult, SessionError};

/// 剂型类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DosageClass {
    /// 固体剂型：离散的数值规格
    Solid,
    /// 液体剂型：浓度/体积
    Liquid,
    /// 干扰项：看似合理但不正确的规格
    Decoy,
}

static FORM_CLASS: phf::Map<&'static str, DosageClass> = phf_map! {
    "tablets" => DosageClass::Solid,
    "capsules" => DosageClass::Solid,
    "powder" => DosageClass::Solid,
    "dragee" => DosageClass::Solid,
    "ampoules" => DosageClass::Liquid,
    "drops" => DosageClass::Liquid,
    "ointment" => DosageClass::Decoy,
    "gel" => DosageClass::Decoy,
    "spray" => DosageClass::Decoy,
    "patch" => DosageClass::Decoy,
};

static FORM_LABELS: phf::Map<&'static str, &'static str> = phf_map! {
    "tablets" => "таблетки",
    "capsules" => "капсулы",
    "powder" => "порошок (суспензия)",
    "dragee" => "драже",
    "ampoules" => "ампулы",
    "drops" => "флакон (капли)",
    "ointment" => "мазь",
    "gel" => "гель",
    "spray" => "спрей / аэрозоль",
    "patch" => "трансдермальный пластырь",
};

pub const SOLID_DOSAGE_OPTIONS: &[&str] = &[
    "0.5", "1", "1.5", "2", "3", "4", "5", "6", "8", "9", "10", "12", "12.5", "15", "16", "20",
    "25", "30", "37.5", "40", "45", "50", "60", "75", "80", "100", "150", "200", "250", "300",
    "400", "500", "750", "1000",
];

pub const LIQUID_DOSAGE_OPTIONS: &[&str] = &[
    "1 mg – 1 ml",
    "2 mg – 1 ml",
    "4 mg – 1 ml",
    "5 mg – 1 ml",
    "10 mg – 1 ml",
    "25 mg – 1 ml",
    "25 mg – 2 ml",
    "25 mg – 5 ml",
    "50 mg – 1 ml",
    "50 mg – 2 ml",
    "100 mg – 1 ml",
    "100 mg – 2 ml",
    "200 mg – 1 ml",
    "1 mg – 1 ml (30 ml)",
    "1 mg – 1 ml (150 ml)",
    "2 mg – 1 ml (30 ml)",
    "100 mg – 1 ml (60 ml)",
    "1 кап. – 1 mg",
    "1 mg – 10 кап.",
    "4% – 125 ml",
];

pub const DECOY_DOSAGE_OPTIONS: &[&str] = &[
    // 伪百分比
    "0.2%",
    "0.25%",
    "0.75%",
    "1.25%",
    "2.5%",
    // 伪 mg/ml
    "2.5 mg – 1 ml",
    "7.5 mg – 1 ml",
    "12.5 mg – 1 ml",
    "15 mg – 1 ml",
    "37.5 mg – 1 ml",
    "75 mg – 1 ml",
    "150 mg – 1 ml",
    // 伪滴剂
    "1 mg – 5 кап.",
    "5 mg – 1 кап.",
    "10 mg – 5 ml",
    "25 mg – 10 ml",
];

impl DosageClass {
    /// 剂型标签 → 类别，未知标签归为干扰项
    pub fn of(form: &str) -> Self {
        FORM_CLASS.get(form).copied().unwrap_or(DosageClass::Decoy)
    }

    pub fn options(self) -> &'static [&'static str] {
        match self {
            DosageClass::Solid => SOLID_DOSAGE_OPTIONS,
            DosageClass::Liquid => LIQUID_DOSAGE_OPTIONS,
            DosageClass::Decoy => DECOY_DOSAGE_OPTIONS,
        }
    }
}

/// 某剂型可选的剂量列表
pub fn candidates(form: &str) -> &'static [&'static str] {
    DosageClass::of(form).options()
}

/// 剂型的显示名称，未知剂型原样返回
pub fn form_label(form: &str) -> &str {
    FORM_LABELS.get(form).copied().unwrap_or(form)
}

/// 已知的全部剂型标签
pub fn known_forms() -> impl Iterator<Item = &'static str> {
    FORM_CLASS.keys().copied()
}

/// 一道题的"剂型 → 已选剂量"
///
/// 键集合始终与当前选中的剂型一致：取消选择的剂型连同其剂量一起丢弃，
/// 仍然选中的剂型保留已选剂量。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormDosageSelection {
    panels: BTreeMap<String, BTreeSet<String>>,
}

impl FormDosageSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按新的剂型集合重新推导面板
    pub fn reconcile<'a, I>(&mut self, selected_forms: I)
    where
        I: IntoIterator<Item = &'a String>,
    {
        let selected: BTreeSet<&str> = selected_forms.into_iter().map(String::as_str).collect();
        self.panels.retain(|form, _| selected.contains(form.as_str()));
        for form in selected {
            self.panels.entry(form.to_string()).or_default();
        }
    }

    /// 勾选/取消一个剂量；剂型未选中或剂量不在列表中时拒绝
    pub fn toggle(&mut self, form: &str, option: &str, checked: bool) -> AppResult<()> {
        let rejected = || SessionError::DosageRejected {
            form: form.to_string(),
            option: option.to_string(),
        };

        if !candidates(form).contains(&option) {
            return Err(rejected().into());
        }
        let panel = self.panels.get_mut(form).ok_or_else(rejected)?;

        if checked {
            panel.insert(option.to_string());
        } else {
            panel.remove(option);
        }
        Ok(())
    }

    pub fn selected(&self, form: &str) -> Option<&BTreeSet<String>> {
        self.panels.get(form)
    }

    pub fn forms(&self) -> impl Iterator<Item = &str> {
        self.panels.keys().map(String::as_str)
    }

    pub fn to_map(&self) -> BTreeMap<String, BTreeSet<String>> {
        self.panels.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn forms(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_classes_are_disjoint_and_cover_known_forms() {
        assert_eq!(known_forms().count(), 10);
        assert_eq!(DosageClass::of("tablets"), DosageClass::Solid);
        assert_eq!(DosageClass::of("drops"), DosageClass::Liquid);
        assert_eq!(DosageClass::of("patch"), DosageClass::Decoy);
        for form in known_forms() {
            assert!(FORM_LABELS.contains_key(form), "缺少显示名称: {}", form);
        }
    }

    #[test]
    fn test_unknown_form_falls_back_to_decoy() {
        assert_eq!(DosageClass::of("suppository"), DosageClass::Decoy);
        assert_eq!(candidates("suppository"), DECOY_DOSAGE_OPTIONS);
        assert_eq!(form_label("suppository"), "suppository");
        assert_eq!(form_label("ampoules"), "ампулы");
    }

    #[test]
    fn test_deselect_discards_and_reselect_starts_empty() {
        let mut selection = FormDosageSelection::new();
        selection.reconcile(&forms(&["ampoules"]));
        selection.toggle("ampoules", "25 mg – 2 ml", true).unwrap();
        selection.toggle("ampoules", "50 mg – 1 ml", true).unwrap();
        assert_eq!(selection.selected("ampoules").unwrap().len(), 2);

        selection.reconcile(&forms(&[]));
        assert!(selection.selected("ampoules").is_none());

        selection.reconcile(&forms(&["ampoules"]));
        assert!(selection.selected("ampoules").unwrap().is_empty());
    }

    #[test]
    fn test_still_selected_form_keeps_choices() {
        let mut selection = FormDosageSelection::new();
        selection.reconcile(&forms(&["tablets"]));
        selection.toggle("tablets", "20", true).unwrap();

        selection.reconcile(&forms(&["tablets", "drops"]));
        assert!(selection.selected("tablets").unwrap().contains("20"));
        assert!(selection.selected("drops").unwrap().is_empty());
        assert_eq!(selection.forms().collect::<Vec<_>>(), vec!["drops", "tablets"]);
    }

    #[test]
    fn test_rejects_foreign_option_and_unselected_form() {
        let mut selection = FormDosageSelection::new();
        selection.reconcile(&forms(&["tablets"]));

        let err = selection.toggle("tablets", "25 mg – 2 ml", true).unwrap_err();
        assert!(matches!(
            err,
            AppError::Session(SessionError::DosageRejected { .. })
        ));
        assert!(selection.toggle("ampoules", "25 mg – 2 ml", true).is_err());
        assert!(selection.selected("tablets").unwrap().is_empty());
    }

    #[test]
    fn test_uncheck_removes_option() {
        let mut selection = FormDosageSelection::new();
        selection.reconcile(&forms(&["gel"]));
        selection.toggle("gel", "0.2%", true).unwrap();
        selection.toggle("gel", "0.2%", false).unwrap();
        assert!(selection.to_map()["gel"].is_empty());
    }
}
