use serde::{Deserialize, Serialize};

/// 页面网格排版方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutArrangement {
    /// 整页一张
    Single,
    /// 左右两栏
    Double,
    /// 2x2 四宫格
    Four,
}

impl LayoutArrangement {
    pub const ALL: [LayoutArrangement; 3] = [
        LayoutArrangement::Single,
        LayoutArrangement::Double,
        LayoutArrangement::Four,
    ];

    /// 单元格数量
    pub fn cell_count(self) -> usize {
        match self {
            LayoutArrangement::Single => 1,
            LayoutArrangement::Double => 2,
            LayoutArrangement::Four => 4,
        }
    }

    /// 归一化的单元格模板，按阅读顺序排列
    ///
    /// 每项为 (top, left, bottom, right)，取值为页面高/宽的比例
    pub fn template(self) -> &'static [(f64, f64, f64, f64)] {
        match self {
            LayoutArrangement::Single => &[(0.0, 0.0, 1.0, 1.0)],
            LayoutArrangement::Double => &[(0.0, 0.0, 1.0, 0.5), (0.0, 0.5, 1.0, 1.0)],
            LayoutArrangement::Four => &[
                (0.0, 0.0, 0.5, 0.5),
                (0.0, 0.5, 0.5, 1.0),
                (0.5, 0.0, 1.0, 0.5),
                (0.5, 0.5, 1.0, 1.0),
            ],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            LayoutArrangement::Single => "single",
            LayoutArrangement::Double => "double",
            LayoutArrangement::Four => "four",
        }
    }

    /// 从配置中的名称解析
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "single" => Some(LayoutArrangement::Single),
            "double" => Some(LayoutArrangement::Double),
            "four" => Some(LayoutArrangement::Four),
            _ => None,
        }
    }
}

impl std::fmt::Display for LayoutArrangement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 排版方式的相对权重
///
/// 权重不要求和为 1，缺省项的默认值由 `LayoutSelector` 决定
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutWeights {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub single: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub double: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub four: Option<f64>,
}

impl LayoutWeights {
    pub fn new(single: f64, double: f64, four: f64) -> Self {
        Self {
            single: Some(single),
            double: Some(double),
            four: Some(four),
        }
    }

    pub fn get(&self, arrangement: LayoutArrangement) -> Option<f64> {
        match arrangement {
            LayoutArrangement::Single => self.single,
            LayoutArrangement::Double => self.double,
            LayoutArrangement::Four => self.four,
        }
    }

    pub fn set(&mut self, arrangement: LayoutArrangement, weight: f64) {
        match arrangement {
            LayoutArrangement::Single => self.single = Some(weight),
            LayoutArrangement::Double => self.double = Some(weight),
            LayoutArrangement::Four => self.four = Some(weight),
        }
    }

    /// 只保留启用的排版方式，其余权重置 0
    pub fn restricted_to(mut self, enabled: &[LayoutArrangement]) -> Self {
        for arrangement in LayoutArrangement::ALL {
            if !enabled.contains(&arrangement) {
                self.set(arrangement, 0.0);
            }
        }
        self
    }
}
