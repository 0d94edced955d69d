//! 棋盘坐标
//!
//! 行 0 对应第 8 横线，列 0 对应 a 线。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{BOARD_SIZE, SQUARE_COUNT};
use crate::error::ChessError;

/// 棋盘坐标（总在界内）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordinate {
    row: u8,
    col: u8,
}

impl Coordinate {
    /// 创建新坐标，越界时报错
    pub fn new(row: i16, col: i16) -> Result<Self, ChessError> {
        if Self::in_bounds(row, col) {
            Ok(Self {
                row: row as u8,
                col: col as u8,
            })
        } else {
            Err(ChessError::InvalidCoordinate { row, col })
        }
    }

    /// 创建新坐标（不检查边界，内部使用）
    pub const fn new_unchecked(row: u8, col: u8) -> Self {
        Self { row, col }
    }

    /// 检查行列是否在棋盘内
    pub fn in_bounds(row: i16, col: i16) -> bool {
        (0..BOARD_SIZE as i16).contains(&row) && (0..BOARD_SIZE as i16).contains(&col)
    }

    /// 行 (0-7，0 为第 8 横线)
    pub fn row(&self) -> u8 {
        self.row
    }

    /// 列 (0-7，0 为 a 线)
    pub fn col(&self) -> u8 {
        self.col
    }

    /// 获取偏移后的坐标
    pub fn offset(&self, dr: i8, dc: i8) -> Option<Coordinate> {
        let row = self.row as i16 + dr as i16;
        let col = self.col as i16 + dc as i16;
        if Self::in_bounds(row, col) {
            Some(Coordinate {
                row: row as u8,
                col: col as u8,
            })
        } else {
            None
        }
    }

    /// 转换为数组索引
    pub fn to_index(&self) -> usize {
        self.row as usize * BOARD_SIZE + self.col as usize
    }

    /// 从数组索引转换
    pub fn from_index(index: usize) -> Option<Self> {
        if index < SQUARE_COUNT {
            Some(Coordinate {
                row: (index / BOARD_SIZE) as u8,
                col: (index % BOARD_SIZE) as u8,
            })
        } else {
            None
        }
    }

    /// 遍历全部 64 个格子（从 a8 到 h1）
    pub fn all() -> impl Iterator<Item = Coordinate> {
        (0..SQUARE_COUNT).map(|index| Coordinate {
            row: (index / BOARD_SIZE) as u8,
            col: (index % BOARD_SIZE) as u8,
        })
    }

    /// 列字母 ('a'..='h')
    pub fn file_char(&self) -> char {
        (b'a' + self.col) as char
    }

    /// 横线数字 ('8'..='1')
    pub fn rank_char(&self) -> char {
        (b'8' - self.row) as char
    }

    /// 两个坐标之间（不含两端）的格子，仅当二者同行、同列或同斜线时非空
    pub fn between(a: Coordinate, b: Coordinate) -> Vec<Coordinate> {
        let Some(step) = a.direction_to(b) else {
            return Vec::new();
        };

        let mut squares = Vec::new();
        let mut current = a;
        while let Some(next) = current.offset(step.0, step.1) {
            if next == b {
                break;
            }
            squares.push(next);
            current = next;
        }
        squares
    }

    /// 单位方向（同行、同列或同斜线时）
    pub fn direction_to(&self, other: Coordinate) -> Option<(i8, i8)> {
        let dr = other.row as i8 - self.row as i8;
        let dc = other.col as i8 - self.col as i8;
        if (dr == 0 && dc == 0) || !(dr == 0 || dc == 0 || dr.abs() == dc.abs()) {
            return None;
        }
        Some((dr.signum(), dc.signum()))
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file_char(), self.rank_char())
    }
}

impl FromStr for Coordinate {
    type Err = ChessError;

    /// 从代数坐标解析（如 "e4"）
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ChessError::InvalidSquare {
            text: s.to_string(),
        };

        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(invalid());
        }

        let file = bytes[0];
        let rank = bytes[1];
        if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) {
            return Err(invalid());
        }

        Ok(Coordinate {
            row: b'8' - rank,
            col: file - b'a',
        })
    }
}
