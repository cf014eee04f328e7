use std::{
    env,
    fs::File,
    io::{Read, Write, stderr},
    path::Path,
    process,
    str::FromStr,
    sync::Arc,
};

use getopts::Options;
use lcauto::LookaheadStrategy;
use lcgrammar::{Grammar, GrammarDef};
use lcpar::{IssueFormatter, LcParserBuilder, NodeIdx, ParseError, Sppt, SpptWalker};
use lcscan::{LeafData, Scanner, Sentence, TerminalTable};
use log::LevelFilter;

fn usage(prog: &str, msg: &str) -> ! {
    let path = Path::new(prog);
    let leaf = match path.file_name() {
        Some(m) => m.to_str().unwrap_or("lcdump"),
        None => "lcdump",
    };
    if !msg.is_empty() {
        writeln!(&mut stderr(), "{}", msg).ok();
    }
    writeln!(
        &mut stderr(),
        "Usage: {} [-g <goal>] [-l <none|lc1>] [-a] [-t] [-d] [-s] [-v...] \
         <grammar.ron> <input file>",
        leaf
    )
    .ok();
    process::exit(1);
}

fn read_file(path: &str) -> String {
    let mut f = match File::open(path) {
        Ok(r) => r,
        Err(e) => {
            writeln!(&mut stderr(), "Can't open file {}: {}", path, e).ok();
            process::exit(1);
        }
    };
    let mut s = String::new();
    if let Err(e) = f.read_to_string(&mut s) {
        writeln!(&mut stderr(), "Can't read file {}: {}", path, e).ok();
        process::exit(1);
    }
    s
}

/// `-v` flags win over `LCDUMP_LOG`, which wins over the default of warnings only.
fn log_level(verbosity: usize) -> LevelFilter {
    match verbosity {
        0 => env::var("LCDUMP_LOG")
            .ok()
            .and_then(|l| LevelFilter::from_str(&l).ok())
            .unwrap_or(LevelFilter::Warn),
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Prints the first alternative of every node, one node per line.
struct TreePrinter {
    out: String,
    depth: usize,
}

impl TreePrinter {
    fn line(&mut self, s: &str) {
        for _ in 0..self.depth {
            self.out.push(' ');
        }
        self.out.push_str(s);
        self.out.push('\n');
    }
}

impl SpptWalker for TreePrinter {
    fn begin_branch(&mut self, sppt: &Sppt, node: NodeIdx, _: usize, alternatives_len: usize) {
        let name = sppt.grammar().rule_name(sppt.node(node).rule());
        if alternatives_len > 1 {
            self.line(&format!("{} ({} alternatives)", name, alternatives_len));
        } else {
            self.line(name);
        }
        self.depth += 1;
    }

    fn end_branch(&mut self, _: &Sppt, _: NodeIdx, _: usize) {
        self.depth -= 1;
    }

    fn leaf(&mut self, sppt: &Sppt, leaf: &LeafData) {
        let name = sppt.grammar().rule_name(leaf.rule);
        let text = &sppt.text()[leaf.start..leaf.end()];
        if text.is_empty() {
            self.line(name);
        } else {
            self.line(&format!("{} {:?}", name, text));
        }
    }

    fn begin_embedded(&mut self, sppt: &Sppt, node: NodeIdx) {
        let name = sppt.grammar().rule_name(sppt.node(node).rule());
        self.line(&format!("{} (embedded)", name));
        self.depth += 1;
    }

    fn end_embedded(&mut self, _: &Sppt, _: NodeIdx) {
        self.depth -= 1;
    }
}

fn print_tokens(grm: &Grammar, text: &str, lines: &[Vec<LeafData>]) {
    for (i, line) in lines.iter().enumerate() {
        let toks = line
            .iter()
            .map(|l| format!("{} {:?}", grm.rule_name(l.rule), &text[l.start..l.end()]))
            .collect::<Vec<_>>();
        println!("{:>4}: {}", i + 1, toks.join(", "));
    }
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let prog = &args[0];
    let matches = match Options::new()
        .optflag("h", "help", "")
        .optopt(
            "g",
            "goal",
            "Rule to parse the input as (default: the first rule)",
            "RULE",
        )
        .optopt(
            "l",
            "lookahead",
            "Lookahead used to prune the parse (default: lc1)",
            "none|lc1",
        )
        .optflag("a", "all", "Print every alternative of ambiguous nodes")
        .optflag("t", "tokens", "Print the tokens of each input line")
        .optflag("d", "dump", "Print the automaton for the goal")
        .optflag("s", "stats", "Print counts of what the parse created")
        .optflagmulti("v", "verbose", "Log more (repeat for more still)")
        .parse(&args[1..])
    {
        Ok(m) => m,
        Err(f) => usage(prog, f.to_string().as_str()),
    };

    if matches.opt_present("h") {
        usage(prog, "");
    }

    if let Err(e) = simplelog::TermLogger::init(
        log_level(matches.opt_count("v")),
        simplelog::ConfigBuilder::new()
            .set_time_format_custom(&[])
            .build(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Never,
    ) {
        writeln!(&mut stderr(), "Can't initialise logging: {}", e).ok();
    }

    let lookahead = match matches.opt_str("l") {
        None => LookaheadStrategy::Lc1,
        Some(s) => match &*s.to_lowercase() {
            "none" => LookaheadStrategy::None,
            "lc1" => LookaheadStrategy::Lc1,
            _ => usage(prog, &format!("Unknown lookahead '{}'.", s)),
        },
    };

    if matches.free.len() != 2 {
        usage(prog, "Too few arguments given.");
    }

    let grm_path = &matches.free[0];
    let def: GrammarDef = match ron::from_str(&read_file(grm_path)) {
        Ok(d) => d,
        Err(e) => {
            writeln!(&mut stderr(), "{}: {}", grm_path, e).ok();
            process::exit(1);
        }
    };
    let grm = match Grammar::new(&def) {
        Ok(g) => Arc::new(g),
        Err(e) => {
            writeln!(&mut stderr(), "{}: {}", grm_path, e).ok();
            process::exit(1);
        }
    };
    let goal = match matches.opt_str("g") {
        Some(g) => g,
        None => match def.rules.iter().find(|r| !r.skip && !r.leaf) {
            Some(r) => r.name.clone(),
            None => usage(prog, &format!("{} has no rule to parse for.", grm_path)),
        },
    };

    let parser = match LcParserBuilder::new(Arc::clone(&grm))
        .lookahead(lookahead)
        .build()
    {
        Ok(p) => p,
        Err(e) => {
            writeln!(&mut stderr(), "{}: {}", grm_path, e).ok();
            process::exit(1);
        }
    };

    if matches.opt_present("d") {
        match parser.state_set(&goal) {
            Ok(ss) => {
                ss.build();
                println!("Automaton for '{}':\n{}", goal, ss.pp());
            }
            Err(e) => {
                writeln!(&mut stderr(), "{}: {}", grm_path, e).ok();
                process::exit(1);
            }
        }
    }

    let input_path = &matches.free[1];
    let input = read_file(input_path);
    let sentence = Sentence::new(&input);
    let (res, stats) = parser.parse_with_stats(&goal, &sentence, 0);
    if matches.opt_present("s") {
        println!(
            "{} GSS nodes, {} completed nodes, {} leaves",
            stats.gss_nodes, stats.completed_nodes, stats.leaves
        );
    }
    match res {
        Ok(sppt) => {
            if matches.opt_present("a") {
                print!("{}", sppt.pp());
            } else {
                let mut p = TreePrinter {
                    out: String::new(),
                    depth: 0,
                };
                sppt.walk(&mut p, false);
                print!("{}", p.out);
            }
            if matches.opt_present("t") {
                print_tokens(&grm, &input, &sppt.tokens_by_line());
            }
            for n in sppt.ambiguities() {
                let span = sppt.node(*n).span();
                log::warn!(
                    "'{}' at {} has equally good derivations",
                    grm.rule_name(sppt.node(*n).rule()),
                    span
                );
            }
        }
        Err(ParseError::Issues(issues)) => {
            if matches.opt_present("t") {
                // There's no tree to take the leaves from, so scan the input on its own.
                match TerminalTable::new(&grm) {
                    Ok(table) => {
                        let leaves = Scanner::new(&grm, &table, &sentence).scan_all();
                        let mut lines = vec![Vec::new(); sentence.lines_len()];
                        for l in leaves {
                            if let Some(line) = sentence.line_of(l.start) {
                                lines[line - 1].push(l);
                            }
                        }
                        print_tokens(&grm, &input, &lines);
                    }
                    Err(e) => {
                        writeln!(&mut stderr(), "{}: {}", grm_path, e).ok();
                    }
                }
            }
            let formatter = IssueFormatter::new(&input, Path::new(input_path));
            println!("{}", formatter.format_issues(&issues));
            process::exit(1);
        }
        Err(e) => {
            writeln!(&mut stderr(), "{}: {}", input_path, e).ok();
            process::exit(1);
        }
    }
}
