//! # CLI Integration Tests
//!
//! Argument parsing, subcommand shapes and flag interplay.

#[cfg(test)]
mod tests {
    use clap::Parser;
    use std::path::PathBuf;

    use crate::cli::{AxisOrderArg, Cli, Commands, ConfigFormat, FormatArg, OutputFormat, TemplateType};

    /// Test basic CLI argument parsing
    #[test]
    fn test_cli_help() {
        let result = Cli::try_parse_from(["gridpoint", "--help"]);
        assert!(result.is_err()); // --help causes early exit with "error"

        let error = result.unwrap_err();
        assert!(error.to_string().contains("gridded dataset"));
    }

    #[test]
    fn test_cli_version() {
        let result = Cli::try_parse_from(["gridpoint", "--version"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::parse_from([
            "gridpoint",
            "--verbose",
            "--output-format",
            "json",
            "--config",
            "/path/to/job.yaml",
            "template",
            "basic",
        ]);

        assert!(cli.verbose);
        assert_eq!(cli.output_format, OutputFormat::Json);
        assert_eq!(cli.config, Some(PathBuf::from("/path/to/job.yaml")));
    }

    #[test]
    fn test_run_command_overrides() {
        let cli = Cli::parse_from([
            "gridpoint",
            "run",
            "--config",
            "job.json",
            "--point",
            "-12.5,130.25",
            "--plot-output",
            "north.svg",
            "--parquet-output",
            "north.parquet",
            "--rounding",
            "4",
            "--dry-run",
        ]);

        if let Commands::Run {
            point,
            plot_output,
            parquet_output,
            rounding,
            dry_run,
        } = &cli.command
        {
            let point = point.expect("point parsed");
            assert_eq!(point.lat, -12.5);
            assert_eq!(point.lon, 130.25);
            assert_eq!(plot_output.as_deref(), Some("north.svg"));
            assert_eq!(parquet_output.as_deref(), Some("north.parquet"));
            assert_eq!(*rounding, Some(4));
            assert!(*dry_run);
        } else {
            panic!("Expected Run command");
        }
        assert_eq!(cli.config, Some(PathBuf::from("job.json")));
    }

    #[test]
    fn test_extract_command() {
        let cli = Cli::parse_from([
            "gridpoint",
            "extract",
            "../db/gpm-imerg",
            "-f",
            "3B-MO.MS.MRG.3IMERG",
            "-n",
            "precipitation",
            "--point",
            "30.5,38.5",
            "--format",
            "hdf5",
            "--axis-order",
            "lat-lon",
        ]);

        if let Commands::Extract {
            directory,
            filter,
            variable,
            point,
            format,
            group,
            axis_order,
            rounding,
            no_rounding,
        } = &cli.command
        {
            assert_eq!(directory, &PathBuf::from("../db/gpm-imerg"));
            assert_eq!(filter, "3B-MO.MS.MRG.3IMERG");
            assert_eq!(variable, "precipitation");
            assert_eq!(point.lat, 30.5);
            assert_eq!(*format, FormatArg::Hdf5);
            assert_eq!(*group, None);
            assert_eq!(*axis_order, Some(AxisOrderArg::LatLon));
            assert_eq!(*rounding, 8);
            assert!(!no_rounding);
        } else {
            panic!("Expected Extract command");
        }
    }

    #[test]
    fn test_extract_requires_point() {
        let result = Cli::try_parse_from([
            "gridpoint",
            "extract",
            "../db/gldas",
            "-f",
            "GLDAS",
            "-n",
            "TWS_monthly",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_extract_rejects_bad_point() {
        let result = Cli::try_parse_from([
            "gridpoint",
            "extract",
            "../db/gldas",
            "-f",
            "GLDAS",
            "-n",
            "TWS_monthly",
            "--point",
            "120,10",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rounding_conflicts_with_no_rounding() {
        let result = Cli::try_parse_from([
            "gridpoint",
            "extract",
            "dir",
            "-f",
            "x",
            "-n",
            "v",
            "--point",
            "0,0",
            "--rounding",
            "3",
            "--no-rounding",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_info_command() {
        let cli = Cli::parse_from([
            "gridpoint",
            "info",
            "grid.HDF5",
            "--detailed",
            "-n",
            "precipitation",
            "--format",
            "json",
        ]);

        if let Commands::Info {
            file,
            detailed,
            variable,
            format,
        } = &cli.command
        {
            assert_eq!(file, "grid.HDF5");
            assert!(*detailed);
            assert_eq!(variable, &Some("precipitation".to_string()));
            assert_eq!(format, &Some(OutputFormat::Json));
        } else {
            panic!("Expected Info command");
        }
    }

    #[test]
    fn test_validate_command() {
        let cli = Cli::parse_from(["gridpoint", "validate", "job.yaml", "--detailed"]);

        if let Commands::Validate {
            config_file,
            detailed,
        } = &cli.command
        {
            assert_eq!(config_file, &Some(PathBuf::from("job.yaml")));
            assert!(*detailed);
        } else {
            panic!("Expected Validate command");
        }
    }

    #[test]
    fn test_template_command() {
        let cli = Cli::parse_from([
            "gridpoint",
            "template",
            "grace",
            "--output",
            "grace.yaml",
            "--format",
            "yaml",
        ]);

        if let Commands::Template {
            template_type,
            output,
            format,
        } = &cli.command
        {
            assert_eq!(template_type, &TemplateType::Grace);
            assert_eq!(output, &Some(PathBuf::from("grace.yaml")));
            assert_eq!(format, &ConfigFormat::Yaml);
        } else {
            panic!("Expected Template command");
        }
    }

    #[test]
    fn test_template_types() {
        let templates = [
            ("basic", TemplateType::Basic),
            ("grace", TemplateType::Grace),
            ("precipitation", TemplateType::Precipitation),
        ];

        for (name, expected) in templates {
            let cli = Cli::parse_from(["gridpoint", "template", name]);
            if let Commands::Template { template_type, .. } = &cli.command {
                assert_eq!(template_type, &expected);
            } else {
                panic!("Expected Template command");
            }
        }
    }

    #[test]
    fn test_output_format_values() {
        let formats = [
            ("human", OutputFormat::Human),
            ("json", OutputFormat::Json),
            ("yaml", OutputFormat::Yaml),
            ("csv", OutputFormat::Csv),
        ];

        for (name, expected) in formats {
            let cli = Cli::parse_from(["gridpoint", "--output-format", name, "template", "basic"]);
            assert_eq!(cli.output_format, expected);
        }
    }

    #[test]
    fn test_verbose_quiet_conflict() {
        let result = Cli::try_parse_from(["gridpoint", "--verbose", "--quiet", "info", "grid.nc"]);
        assert!(result.is_err());

        let cli_quiet = Cli::parse_from(["gridpoint", "--quiet", "info", "grid.nc"]);
        assert!(!cli_quiet.verbose);
        assert!(cli_quiet.quiet);
    }

    #[test]
    fn test_rounding_is_bounded() {
        let extract = |digits: &str| {
            Cli::try_parse_from([
                "gridpoint", "extract", "dir", "-f", "x", "-n", "v", "--point", "0,0",
                "--rounding", digits,
            ])
        };
        assert!(extract("15").is_ok());
        assert!(extract("16").is_err());
        assert!(extract("4294967295").is_err());

        let run = |digits: &str| {
            Cli::try_parse_from(["gridpoint", "run", "--config", "job.json", "--rounding", digits])
        };
        assert!(run("0").is_ok());
        assert!(run("16").is_err());
    }

    #[test]
    fn test_failure_message_reports_context_once() {
        let err = anyhow::anyhow!("No file in 'db' contains 'GRAC'")
            .context("Failed to extract 'lwe' from db");
        let message = crate::failure_message(&err);
        assert_eq!(
            message,
            "Error: Failed to extract 'lwe' from db: No file in 'db' contains 'GRAC'"
        );
        assert_eq!(message.matches("GRAC").count(), 1);
    }
}
