//! Attribute extraction from normalized report text.
//!
//! Every field is resolved by an ordered matcher:
//! - form factor: any laptop marker (case-sensitive substring)
//! - RAM generation: earliest `DDR4` / `DDR5` not glued to a prefix (`GDDR5`, `LPDDR5` are skipped)
//! - chipset: first vocabulary token present, in vocabulary order
//! - CPU: earliest `AMD` / `Intel` marker, CPU-labeled lines first
//! - GPU: first vocabulary keyword hit, in vocabulary order, GPU-labeled lines first;
//!   outside labeled lines a bare `AMD` / `Intel` never counts on a line naming the processor
//!
//! Missing evidence yields `Unknown` / `None`; nothing is guessed.

use crate::config::toml_config::VocabularyConfig;
use crate::domain::model::{
    Ambiguity, CpuInfo, CpuVendor, GpuInfo, GpuVendor, HardwareProfile, RamGeneration,
};
use regex::Regex;
use std::sync::OnceLock;

const CPU_VENDOR_MARKERS: [(&str, CpuVendor); 2] = [("AMD", CpuVendor::Amd), ("Intel", CpuVendor::Intel)];

/// Product families that only name processors.
const CPU_FAMILY_MARKERS: [&str; 8] = [
    "Ryzen",
    "Athlon",
    "Threadripper",
    "EPYC",
    "Core",
    "Xeon",
    "Pentium",
    "Celeron",
];

fn unlocked_suffix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d{3,5}(?:KS|KF|K)\b").expect("valid regex"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Boundary {
    /// 前一個字元不可為英數字
    Leading,
    /// 前後都不可為英數字
    Both,
}

/// 在 `haystack` 中尋找第一個符合邊界條件的 `needle`，回傳位元組位置
fn find_token(haystack: &str, needle: &str, ignore_case: bool, boundary: Boundary) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }

    let (hay, pat) = if ignore_case {
        (haystack.to_ascii_lowercase(), needle.to_ascii_lowercase())
    } else {
        (haystack.to_string(), needle.to_string())
    };

    let bytes = hay.as_bytes();
    hay.match_indices(pat.as_str()).map(|(pos, _)| pos).find(|&pos| {
        let leading_ok = pos == 0 || !bytes[pos - 1].is_ascii_alphanumeric();
        let end = pos + pat.len();
        let trailing_ok = match boundary {
            Boundary::Leading => true,
            Boundary::Both => end >= bytes.len() || !bytes[end].is_ascii_alphanumeric(),
        };
        leading_ok && trailing_ok
    })
}

fn is_cpu_vendor_name(keyword: &str) -> bool {
    CPU_VENDOR_MARKERS
        .iter()
        .any(|(marker, _)| keyword.eq_ignore_ascii_case(marker))
}

/// 行首是否為指定標籤（例如 "CPU:"、"Processor"）
fn is_labeled(line: &str, labels: &[String]) -> bool {
    let trimmed = line.trim_start();
    labels
        .iter()
        .any(|label| find_token(trimmed, label, true, Boundary::Both) == Some(0))
}

pub struct AttributeExtractor<'a> {
    vocabulary: &'a VocabularyConfig,
}

impl<'a> AttributeExtractor<'a> {
    pub fn new(vocabulary: &'a VocabularyConfig) -> Self {
        Self { vocabulary }
    }

    pub fn extract(&self, text: &str) -> HardwareProfile {
        // 機型判斷必須最先執行
        let is_laptop = self.detect_laptop(text);

        let lines: Vec<&str> = text.lines().collect();
        let mut ambiguities = Vec::new();

        let (ram_generation, ram_ambiguous) = self.detect_ram_generation(text);
        if ram_ambiguous {
            ambiguities.push(Ambiguity::RamGeneration);
        }

        let motherboard_chipset = self.detect_chipset(text);

        let (cpu_match, cpu_ambiguous) = self.detect_cpu(&lines);
        if cpu_ambiguous {
            ambiguities.push(Ambiguity::CpuVendor);
        }
        let cpu_line = cpu_match.as_ref().map(|(index, _)| *index);
        let cpu = cpu_match.map(|(_, info)| info);

        let gpu = self.detect_gpu(
            &lines,
            cpu_line,
            cpu.as_ref().map(|info| info.raw_label.as_str()),
            motherboard_chipset.as_deref(),
        );
        let ram_slot_empty = self.detect_empty_ram_slot(&lines);

        let profile = HardwareProfile {
            ram_generation,
            motherboard_chipset,
            cpu,
            gpu,
            is_laptop,
            ram_slot_empty,
            ambiguities,
        };

        tracing::debug!(
            "Extracted profile: laptop={}, ram={}, chipset={:?}, cpu={:?}, gpu={:?}, empty_slot={}",
            profile.is_laptop,
            profile.ram_generation,
            profile.motherboard_chipset,
            profile.cpu,
            profile.gpu,
            profile.ram_slot_empty
        );

        profile
    }

    fn detect_laptop(&self, text: &str) -> bool {
        self.vocabulary
            .laptop_markers
            .iter()
            .any(|marker| !marker.is_empty() && text.contains(marker.as_str()))
    }

    fn detect_ram_generation(&self, text: &str) -> (RamGeneration, bool) {
        // 前綴相連者為顯示卡或行動版記憶體（GDDR5、LPDDR5），不算系統記憶體
        let ddr4 = find_token(text, "DDR4", false, Boundary::Leading);
        let ddr5 = find_token(text, "DDR5", false, Boundary::Leading);

        match (ddr4, ddr5) {
            (Some(four), Some(five)) => {
                let generation = if four < five {
                    RamGeneration::Ddr4
                } else {
                    RamGeneration::Ddr5
                };
                tracing::warn!(
                    "⚠️ Report mentions both DDR4 and DDR5; using {} (first occurrence)",
                    generation
                );
                (generation, true)
            }
            (Some(_), None) => (RamGeneration::Ddr4, false),
            (None, Some(_)) => (RamGeneration::Ddr5, false),
            (None, None) => (RamGeneration::Unknown, false),
        }
    }

    fn detect_chipset(&self, text: &str) -> Option<String> {
        // 依詞彙表順序，而非文字位置
        self.vocabulary
            .chipsets
            .iter()
            .find(|token| find_token(text, token, false, Boundary::Leading).is_some())
            .cloned()
    }

    /// 回傳 (行號, CPU) 以及是否同時出現兩家廠牌
    fn detect_cpu(&self, lines: &[&str]) -> (Option<(usize, CpuInfo)>, bool) {
        let labeled: Vec<usize> = (0..lines.len())
            .filter(|&i| is_labeled(lines[i], &self.vocabulary.cpu_labels))
            .collect();

        if let Some((found, ambiguous)) = self.first_vendor_marker(lines, &labeled) {
            return (Some(found), ambiguous);
        }

        // 沒有標籤時全域掃描，先略過顯示卡相關的行
        let non_gpu: Vec<usize> = (0..lines.len())
            .filter(|&i| !self.is_gpu_line(lines[i]))
            .collect();
        if let Some((found, ambiguous)) = self.first_vendor_marker(lines, &non_gpu) {
            return (Some(found), ambiguous);
        }

        let all: Vec<usize> = (0..lines.len()).collect();
        if let Some((found, ambiguous)) = self.first_vendor_marker(lines, &all) {
            return (Some(found), ambiguous);
        }

        // 有 CPU 標籤但沒有廠牌資訊
        let unknown = labeled.first().map(|&i| {
            (
                i,
                CpuInfo {
                    vendor: CpuVendor::Unknown,
                    raw_label: lines[i].trim().to_string(),
                    is_unlocked_intel: false,
                },
            )
        });
        (unknown, false)
    }

    fn first_vendor_marker(
        &self,
        lines: &[&str],
        candidates: &[usize],
    ) -> Option<((usize, CpuInfo), bool)> {
        let mut first: Option<(usize, usize, CpuVendor)> = None;
        let mut vendors_seen = Vec::new();

        for &index in candidates {
            for (marker, vendor) in CPU_VENDOR_MARKERS {
                if let Some(pos) = find_token(lines[index], marker, false, Boundary::Both) {
                    if !vendors_seen.contains(&vendor) {
                        vendors_seen.push(vendor);
                    }
                    let earlier = match first {
                        None => true,
                        Some((line, col, _)) => (index, pos) < (line, col),
                    };
                    if earlier {
                        first = Some((index, pos, vendor));
                    }
                }
            }
        }

        let (index, pos, vendor) = first?;
        let raw_label = lines[index][pos..].trim().to_string();
        let is_unlocked_intel =
            vendor == CpuVendor::Intel && unlocked_suffix_re().is_match(&raw_label);

        let ambiguous = vendors_seen.len() > 1;
        if ambiguous {
            tracing::warn!(
                "⚠️ Report mentions both AMD and Intel processors; using '{}'",
                raw_label
            );
        }

        Some((
            (
                index,
                CpuInfo {
                    vendor,
                    raw_label,
                    is_unlocked_intel,
                },
            ),
            ambiguous,
        ))
    }

    /// 含有顯示卡關鍵字（CPU 廠牌名本身除外）或顯示卡標籤的行
    fn is_gpu_line(&self, line: &str) -> bool {
        if is_labeled(line, &self.vocabulary.gpu_labels) {
            return true;
        }
        self.vocabulary.gpu.iter().any(|entry| {
            entry.keywords.iter().any(|keyword| {
                !is_cpu_vendor_name(keyword) && find_token(line, keyword, true, Boundary::Both).is_some()
            })
        })
    }

    /// A line that repeats the processor, e.g. "Installed: AMD Ryzen 5 5600X 6-Core".
    fn mentions_cpu(line: &str, cpu_label: Option<&str>) -> bool {
        let repeats_label = cpu_label
            .map(str::trim)
            .is_some_and(|label| !label.is_empty() && line.contains(label));
        repeats_label
            || CPU_FAMILY_MARKERS
                .iter()
                .any(|family| find_token(line, family, false, Boundary::Both).is_some())
    }

    fn detect_gpu(
        &self,
        lines: &[&str],
        cpu_line: Option<usize>,
        cpu_label: Option<&str>,
        chipset: Option<&str>,
    ) -> Option<GpuInfo> {
        let labeled: Vec<usize> = (0..lines.len())
            .filter(|&i| is_labeled(lines[i], &self.vocabulary.gpu_labels))
            .collect();

        if let Some(gpu) = self.first_gpu_keyword(lines, &labeled, false, None) {
            return Some(gpu);
        }

        // 全域掃描：排除 CPU 與主機板所在的行，避免 CPU 的 "AMD" 被當成顯示卡
        let global: Vec<usize> = (0..lines.len())
            .filter(|&i| Some(i) != cpu_line)
            .filter(|&i| !is_labeled(lines[i], &self.vocabulary.cpu_labels))
            .filter(|&i| {
                chipset
                    .map(|token| find_token(lines[i], token, false, Boundary::Leading).is_none())
                    .unwrap_or(true)
            })
            .collect();

        if let Some(gpu) = self.first_gpu_keyword(lines, &global, true, cpu_label) {
            return Some(gpu);
        }

        labeled.first().map(|&i| GpuInfo {
            vendor: GpuVendor::Unknown,
            raw_label: lines[i].trim().to_string(),
        })
    }

    /// With `guard_cpu_lines`, a bare vendor keyword is ignored on lines that mention the processor.
    fn first_gpu_keyword(
        &self,
        lines: &[&str],
        candidates: &[usize],
        guard_cpu_lines: bool,
        cpu_label: Option<&str>,
    ) -> Option<GpuInfo> {
        for entry in &self.vocabulary.gpu {
            for keyword in &entry.keywords {
                let guarded = is_cpu_vendor_name(keyword);
                let hit = candidates.iter().find(|&&i| {
                    find_token(lines[i], keyword, true, Boundary::Both).is_some()
                        && !(guard_cpu_lines && guarded && Self::mentions_cpu(lines[i], cpu_label))
                });
                if let Some(&i) = hit {
                    return Some(GpuInfo {
                        vendor: entry.vendor,
                        raw_label: lines[i].trim().to_string(),
                    });
                }
            }
        }
        None
    }

    fn detect_empty_ram_slot(&self, lines: &[&str]) -> bool {
        lines.iter().any(|line| {
            let is_slot = self
                .vocabulary
                .ram_slot_labels
                .iter()
                .any(|label| find_token(line, label, true, Boundary::Leading).is_some());
            is_slot
                && self
                    .vocabulary
                    .empty_slot_markers
                    .iter()
                    .any(|marker| find_token(line, marker, true, Boundary::Both).is_some())
        })
    }
}
