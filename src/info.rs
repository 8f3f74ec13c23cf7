//! # Grid File Information Module
//!
//! Extracts and displays the structure of a netCDF/HDF5 grid file: dimensions,
//! variables, attributes and sub-groups. Useful for checking which layout and axis
//! order a new dataset needs before adding it to a job.

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Information about a dimension
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionInfo {
    pub name: String,
    pub length: usize,
    pub is_unlimited: bool,
}

/// Information about a variable
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableInfo {
    pub name: String,
    pub data_type: String,
    pub dimensions: Vec<String>,
    pub attributes: BTreeMap<String, String>,
    pub shape: Vec<usize>,
}

/// Contents of one group (the root group included)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupInfo {
    pub name: String,
    pub dimensions: Vec<DimensionInfo>,
    pub variables: Vec<VariableInfo>,
    pub attributes: BTreeMap<String, String>,
    pub groups: Vec<GroupInfo>,
}

/// Complete information about a grid file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridFileInfo {
    pub path: String,
    pub file_size: Option<u64>,
    pub root: GroupInfo,
}

/// Reads the structure of `file_path`.
///
/// When `variable` is set only that variable is listed (in every group). Global
/// attributes are collected only when `detailed` is set; group attributes always.
pub fn get_file_info(file_path: &str, variable: Option<&str>, detailed: bool) -> Result<GridFileInfo> {
    debug!("Opening grid file: {}", file_path);
    let file = netcdf::open(file_path)
        .with_context(|| format!("Failed to open grid file: {}", file_path))?;

    let file_size = std::fs::metadata(file_path).ok().map(|m| m.len());

    let mut root = GroupInfo {
        name: "/".to_string(),
        dimensions: file.dimensions().map(|d| dimension_info(&d)).collect(),
        variables: file
            .variables()
            .filter(|v| variable.is_none_or(|name| v.name() == name))
            .map(|v| variable_info(&v))
            .collect(),
        attributes: BTreeMap::new(),
        groups: Vec::new(),
    };
    if detailed {
        root.attributes = collect_attributes(file.attributes());
    }
    for group in file.groups().context("Failed to list groups")? {
        root.groups.push(group_info(&group, variable)?);
    }

    file.close().context("Failed to close grid file")?;

    Ok(GridFileInfo {
        path: file_path.to_string(),
        file_size,
        root,
    })
}

fn group_info(group: &netcdf::Group<'_>, variable: Option<&str>) -> Result<GroupInfo> {
    let mut info = GroupInfo {
        name: group.name().to_string(),
        dimensions: group.dimensions().map(|d| dimension_info(&d)).collect(),
        variables: group
            .variables()
            .filter(|v| variable.is_none_or(|name| v.name() == name))
            .map(|v| variable_info(&v))
            .collect(),
        attributes: collect_attributes(group.attributes()),
        groups: Vec::new(),
    };
    for child in group.groups() {
        info.groups.push(group_info(&child, variable)?);
    }
    Ok(info)
}

fn dimension_info(dim: &netcdf::Dimension<'_>) -> DimensionInfo {
    DimensionInfo {
        name: dim.name().to_string(),
        length: dim.len(),
        is_unlimited: dim.is_unlimited(),
    }
}

fn variable_info(var: &netcdf::Variable<'_>) -> VariableInfo {
    VariableInfo {
        name: var.name().to_string(),
        data_type: format!("{:?}", var.vartype()),
        dimensions: var.dimensions().iter().map(|d| d.name().to_string()).collect(),
        attributes: collect_attributes(var.attributes()),
        shape: var.dimensions().iter().map(|d| d.len()).collect(),
    }
}

fn collect_attributes<'a>(
    attributes: impl Iterator<Item = netcdf::Attribute<'a>>,
) -> BTreeMap<String, String> {
    attributes
        .filter_map(|attr| {
            let value = attr.value().ok()?;
            Some((attr.name().to_string(), format_attribute_value(&value)))
        })
        .collect()
}

fn format_attribute_value(value: &netcdf::AttributeValue) -> String {
    match value {
        netcdf::AttributeValue::Str(s) => s.clone(),
        other => format!("{:?}", other),
    }
}

/// Print file info in human-readable format
pub fn print_file_info_human(info: &GridFileInfo) {
    println!("Grid File Information:");
    println!("  Path: {}", info.path);
    if let Some(size) = info.file_size {
        println!("  File Size: {:.2} MB", size as f64 / 1_048_576.0);
    }
    print_group_human(&info.root, 1);
}

fn print_group_human(group: &GroupInfo, depth: usize) {
    let pad = "  ".repeat(depth);
    println!("{}Group {}", pad, group.name);
    println!("{}  Dimensions: {} total", pad, group.dimensions.len());
    for dim in &group.dimensions {
        println!(
            "{}    {} ({}{})",
            pad,
            dim.name,
            dim.length,
            if dim.is_unlimited { ", unlimited" } else { "" }
        );
    }
    println!("{}  Variables: {} total", pad, group.variables.len());
    for var in &group.variables {
        println!(
            "{}    {} ({}) - dimensions: [{}]",
            pad,
            var.name,
            var.data_type,
            var.dimensions.join(", ")
        );
        for (name, value) in &var.attributes {
            println!("{}      @{}: {}", pad, name, value);
        }
    }
    if !group.attributes.is_empty() {
        println!("{}  Attributes:", pad);
        for (name, value) in &group.attributes {
            println!("{}    @{}: {}", pad, name, value);
        }
    }
    for child in &group.groups {
        print_group_human(child, depth + 1);
    }
}

/// Print file info in JSON format
pub fn print_file_info_json(info: &GridFileInfo) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(info)?);
    Ok(())
}

/// Print file info in YAML format
pub fn print_file_info_yaml(info: &GridFileInfo) -> Result<()> {
    let yaml = serde_yaml::to_string(info).context("Failed to serialize file info to YAML")?;
    println!("{}", yaml);
    Ok(())
}

/// Print file info in CSV format (variables only, every group)
pub fn print_file_info_csv(info: &GridFileInfo) -> Result<()> {
    println!("group,variable_name,data_type,dimensions,shape,attributes_count");
    print_group_csv(&info.root);
    Ok(())
}

fn print_group_csv(group: &GroupInfo) {
    for var in &group.variables {
        let shape = var
            .shape
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(";");
        println!(
            "{},{},{},\"{}\",\"{}\",{}",
            group.name,
            var.name,
            var.data_type,
            var.dimensions.join(";"),
            shape,
            var.attributes.len()
        );
    }
    for child in &group.groups {
        print_group_csv(child);
    }
}
