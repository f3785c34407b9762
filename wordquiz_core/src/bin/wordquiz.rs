//! Terminal front end: play the quiz and manage the word list

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use wordquiz_core::{
    logging, parse_file, Config, EntryDraft, Level, QuizController, QuizEngine, QuizState,
    SqliteRepository, VocabError, VocabResult, WordRepository,
};

const USAGE: &str = "usage: wordquiz <command>

commands:
  play [LEVEL]              play the quiz (default level from WORDQUIZ_LEVEL)
  list [LEVEL]              print stored words
  levels                    word count per level
  add ENGLISH THAI LEVEL    add one word
  import FILE LEVEL         import a .txt, .csv or .xlsx word list
  clear                     delete every word";

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let config = Config::from_env();
    logging::init_tracing(&config.log_level);

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&config, &args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn level_arg(args: &[String], index: usize, default: Level) -> VocabResult<Level> {
    match args.get(index) {
        Some(value) => value.parse(),
        None => Ok(default),
    }
}

fn required_arg<'a>(args: &'a [String], index: usize, name: &str) -> VocabResult<&'a str> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| VocabError::Validation(format!("missing {}\n\n{}", name, USAGE)))
}

fn run(config: &Config, args: &[String]) -> VocabResult<()> {
    let Some(command) = args.first() else {
        println!("{}", USAGE);
        return Ok(());
    };

    let repo = SqliteRepository::open(&config.db_path)?;
    match command.as_str() {
        "play" => {
            let level = level_arg(args, 1, config.default_level)?;
            let engine = QuizEngine::new().with_pronouncer(config.pronouncer());
            let mut controller = QuizController::with_engine(repo, engine);
            play(&mut controller, level)?;
            return controller.into_repository().close();
        }
        "list" => {
            let level = args.get(1).map(|l| l.parse::<Level>()).transpose()?;
            for word in repo.list(level)? {
                println!(
                    "{:>5}  {:<4} {:<24} {}",
                    word.id.unwrap_or_default(),
                    word.level,
                    word.english,
                    word.thai
                );
            }
        }
        "levels" => {
            for count in repo.count_by_level()? {
                println!("{}  {}", count.level, count.word_count);
            }
        }
        "add" => {
            let english = required_arg(args, 1, "ENGLISH")?;
            let thai = required_arg(args, 2, "THAI")?;
            let level: Level = required_arg(args, 3, "LEVEL")?.parse()?;
            let entry = repo.create(&EntryDraft::new(english, thai, level))?;
            println!("added '{}' (id {})", entry.english, entry.id.unwrap_or_default());
        }
        "import" => {
            let path = required_arg(args, 1, "FILE")?;
            let level: Level = required_arg(args, 2, "LEVEL")?.parse()?;
            let drafts = parse_file(path, level)?;
            let summary = repo.bulk_upsert(&drafts)?;
            println!(
                "imported {} words: {} new, {} updated, {} unchanged",
                drafts.len(),
                summary.inserted,
                summary.modified,
                summary.matched - summary.modified
            );
        }
        "clear" => {
            let deleted = repo.delete_all()?;
            println!("deleted {} words", deleted);
        }
        other => {
            return Err(VocabError::Validation(format!("unknown command '{}'\n\n{}", other, USAGE)));
        }
    }
    repo.close()
}

fn play(controller: &mut QuizController<SqliteRepository>, level: Level) -> VocabResult<()> {
    controller.set_level(level);
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        let snapshot = controller.snapshot();
        if let Some(error) = &snapshot.error {
            println!("! {}", error);
        }

        match snapshot.state {
            QuizState::Init | QuizState::EmptyLevel => {
                println!("No words for level {}. Type 'l LEVEL' to switch or 'q' to quit.", snapshot.level);
            }
            QuizState::Complete => {
                println!(
                    "Level {} complete: {}/{} words, {:.0}% accuracy. 'r' restarts.",
                    snapshot.level,
                    snapshot.completed.len(),
                    snapshot.total_words,
                    snapshot.stats.accuracy_percent
                );
            }
            QuizState::InProgress => {
                if let Some(word) = &snapshot.current {
                    println!(
                        "\n[{}] {}/{}  {}",
                        snapshot.level,
                        snapshot.completed.len(),
                        snapshot.total_words,
                        word.english
                    );
                }
                for (i, option) in snapshot.options.iter().enumerate() {
                    println!("  {}) {}", i + 1, option);
                }
            }
        }

        print!("> ");
        io::stdout().flush().ok();
        let Some(line) = lines.next() else {
            return Ok(());
        };
        let line = line.map_err(|e| VocabError::Validation(format!("failed to read input: {}", e)))?;
        let input = line.trim();

        match input {
            "q" => return Ok(()),
            "r" => controller.restart(),
            "s" => {
                if let Some(answer) = controller.show_answer() {
                    println!("answer: {}", answer);
                }
            }
            "p" => controller.speak_current(),
            _ if input.starts_with("l ") => match input[2..].parse::<Level>() {
                Ok(level) => {
                    controller.change_level(level);
                }
                Err(e) => println!("! {}", e),
            },
            _ => {
                let choice = input
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| snapshot.options.get(i).cloned())
                    .unwrap_or_else(|| input.to_string());
                if controller.submit_answer(&choice) {
                    println!("correct!");
                } else if snapshot.state == QuizState::InProgress {
                    println!("try again");
                }
            }
        }
    }
}
