use std::collections::HashMap;
use std::path::{Path, PathBuf};

///
/// `samtools` subcommands used by the pipeline.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Samtools {
    View,
    Sort,
    Index,
    Merge,
    Fixmate,
    Markdup,
}

///
/// `bedtools` subcommands used by the pipeline.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bedtools {
    Genomecov,
    Bamtobed,
    Intersect,
}

///
/// An external program together with the subcommand it is run with.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    Bowtie2,
    BwaMem,
    Samtools(Samtools),
    Bedtools(Bedtools),
    FastqDump,
    Vap,
}

impl Tool {
    ///
    /// Key of the program in configuration files, also its default executable name.
    ///
    pub fn key(&self) -> &'static str {
        match self {
            Tool::Bowtie2 => "bowtie2",
            Tool::BwaMem => "bwa",
            Tool::Samtools(_) => "samtools",
            Tool::Bedtools(_) => "bedtools",
            Tool::FastqDump => "fastq-dump",
            Tool::Vap => "vap",
        }
    }

    pub fn subcommand(&self) -> Option<&'static str> {
        match self {
            Tool::BwaMem => Some("mem"),
            Tool::Samtools(sub) => Some(match sub {
                Samtools::View => "view",
                Samtools::Sort => "sort",
                Samtools::Index => "index",
                Samtools::Merge => "merge",
                Samtools::Fixmate => "fixmate",
                Samtools::Markdup => "markdup",
            }),
            Tool::Bedtools(sub) => Some(match sub {
                Bedtools::Genomecov => "genomecov",
                Bedtools::Bamtobed => "bamtobed",
                Bedtools::Intersect => "intersect",
            }),
            _ => None,
        }
    }

    ///
    /// Thread flags for a budget of `threads` in total. Tools whose flag counts
    /// extra workers get `threads - 1`. Nothing is emitted for a budget of one.
    ///
    pub fn thread_args(&self, threads: usize) -> Vec<String> {
        if threads <= 1 {
            return vec![];
        }
        match self {
            Tool::Bowtie2 => vec!["-p".to_string(), threads.to_string()],
            Tool::BwaMem => vec!["-t".to_string(), threads.to_string()],
            Tool::Samtools(Samtools::Index) => vec!["-@".to_string(), (threads - 1).to_string()],
            Tool::Samtools(_) => vec!["--threads".to_string(), (threads - 1).to_string()],
            Tool::Bedtools(_) | Tool::FastqDump | Tool::Vap => vec![],
        }
    }
}

///
/// Executable names for every tool, with per-installation overrides.
///
#[derive(Debug, Clone, Default)]
pub struct Toolbox {
    overrides: HashMap<String, String>,
}

impl Toolbox {
    pub fn new(overrides: HashMap<String, String>) -> Toolbox {
        Toolbox { overrides }
    }

    pub fn program(&self, tool: Tool) -> &str {
        self.overrides
            .get(tool.key())
            .map(|p| p.as_str())
            .unwrap_or(tool.key())
    }

    pub fn command(&self, tool: Tool) -> ToolCommand {
        ToolCommand::new(tool, self.program(tool))
    }
}

///
/// One invocation of an external tool: arguments, thread budget and an
/// optional file receiving standard output.
///
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCommand {
    pub tool: Tool,
    pub program: String,
    thread_args: Vec<String>,
    args: Vec<String>,
    pub stdout: Option<PathBuf>,
    pub current_dir: Option<PathBuf>,
}

impl ToolCommand {
    pub fn new(tool: Tool, program: &str) -> ToolCommand {
        ToolCommand {
            tool,
            program: program.to_string(),
            thread_args: vec![],
            args: vec![],
            stdout: None,
            current_dir: None,
        }
    }

    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn path<P: AsRef<Path>>(self, path: P) -> Self {
        let path = path.as_ref().to_string_lossy().to_string();
        self.arg(path)
    }

    pub fn option<S: Into<String>>(self, flag: &str, value: S) -> Self {
        self.arg(flag).arg(value)
    }

    pub fn path_option<P: AsRef<Path>>(self, flag: &str, path: P) -> Self {
        self.arg(flag).path(path)
    }

    /// Opaque pass-through arguments given by the user.
    pub fn args<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(extra.into_iter().map(|a| a.into()));
        self
    }

    pub fn threads(mut self, threads: usize) -> Self {
        self.thread_args = self.tool.thread_args(threads);
        self
    }

    pub fn stdout_to<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.stdout = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn current_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Arguments after the program name.
    pub fn arguments(&self) -> Vec<String> {
        let mut all: Vec<String> = self.tool.subcommand().into_iter().map(String::from).collect();
        all.extend(self.thread_args.iter().cloned());
        all.extend(self.args.iter().cloned());
        all
    }

    /// Full command vector, program first.
    pub fn argv(&self) -> Vec<String> {
        let mut argv = vec![self.program.clone()];
        argv.extend(self.arguments());
        argv
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(Tool::Samtools(Samtools::Sort), 4, vec!["--threads", "3"])]
    #[case(Tool::Samtools(Samtools::Index), 4, vec!["-@", "3"])]
    #[case(Tool::Bowtie2, 4, vec!["-p", "4"])]
    #[case(Tool::BwaMem, 2, vec!["-t", "2"])]
    #[case(Tool::Bedtools(Bedtools::Genomecov), 8, vec![])]
    #[case(Tool::Samtools(Samtools::View), 1, vec![])]
    #[case(Tool::Bowtie2, 0, vec![])]
    fn thread_translation(#[case] tool: Tool, #[case] threads: usize, #[case] expected: Vec<&str>) {
        assert_eq!(tool.thread_args(threads), expected);
    }

    #[rstest]
    fn thread_flags_follow_the_subcommand() {
        let cmd = Toolbox::default()
            .command(Tool::Samtools(Samtools::Sort))
            .option("-o", "out.bam")
            .arg("in.bam")
            .threads(2);
        assert_eq!(
            cmd.argv(),
            vec!["samtools", "sort", "--threads", "1", "-o", "out.bam", "in.bam"]
        );
    }

    #[rstest]
    fn overrides_replace_the_program() {
        let toolbox = Toolbox::new(HashMap::from([(
            "bedtools".to_string(),
            "/opt/bin/bedtools".to_string(),
        )]));
        let cmd = toolbox.command(Tool::Bedtools(Bedtools::Genomecov));
        assert_eq!(cmd.argv(), vec!["/opt/bin/bedtools", "genomecov"]);
        assert_eq!(toolbox.program(Tool::Vap), "vap");
    }
}
