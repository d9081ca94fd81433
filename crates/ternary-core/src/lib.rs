//! 三元相图核心引擎
//!
//! 在 2-单纯形（吉布斯三角形）上管理带标签的组成点和连接点的结线，
//! 并提供两类几何查询：直线求交与杠杆规则。
//!
//! # 架构设计
//!
//! - `coords`: 原始输入归一化、重心坐标与平面坐标互转
//! - `store`: 点/线集合、结构不变量与级联删除
//! - `geometry`: 无状态几何算法
//! - `properties`: 颜色、标记、线型等视觉属性（只做语法校验）
//!
//! 核心不接触像素，只产出供渲染端映射到画布的几何/数据值。
//!
//! # 示例
//!
//! ```rust
//! use ternary_core::prelude::*;
//!
//! let mut store = EntityStore::new();
//! let p1 = store.add_point("P1", 0.5, 0.3, 0.2, PointStyle::default()).unwrap();
//! let p2 = store.add_point("P2", 0.2, 0.6, 0.2, PointStyle::default()).unwrap();
//! let line = store.add_line(&p1, &p2, LineStroke::default()).unwrap();
//!
//! store.remove_point(&p1).unwrap();
//! assert!(!store.contains_line(&line));
//! ```

pub mod coords;
pub mod entity;
pub mod error;
pub mod geometry;
pub mod math;
pub mod properties;
pub mod ratio;
pub mod store;

pub mod prelude {
    //! 常用类型的便捷导入
    pub use crate::coords::{from_planar, normalize, to_planar, Composition};
    pub use crate::entity::{Line, LineUpdate, Point, PointUpdate, Uid};
    pub use crate::error::{CoreError, CoreResult};
    pub use crate::geometry::{GeometryEngine, IntersectionInfo, LeverInfo};
    pub use crate::math::Point2;
    pub use crate::properties::{Color, LineStroke, LineType, MarkerSymbol, PointStyle};
    pub use crate::ratio::find_integer_ratio;
    pub use crate::store::EntityStore;
}
