use crate::compiler_messages::compiler_errors::{CompilerError, CompilerMessages, ErrorType};
use crate::compiler_messages::compiler_warnings::print_formatted_warning;
use saying::say;

pub fn print_compiler_messages(messages: CompilerMessages) {
    // Format and print out the messages:
    for err in messages.errors {
        print_formatted_error(err);
    }

    for warning in messages.warnings {
        print_formatted_warning(warning);
    }
}

pub fn print_formatted_error(e: CompilerError) {
    let location = e.location.to_string();

    match e.error_type {
        ErrorType::MalformedProgram => {
            if !location.is_empty() {
                say!("\n(╯°□°)╯  🔥🔥 ", Dark Magenta location, " 🔥🔥  Σ(°△°;) ");
            }

            say!(Red "Malformed program");
            say!(Dark Yellow "the front end produced something the generator can't translate");
        }

        ErrorType::Input => {
            say!(Yellow "Can't decode the program: ", location);
        }

        ErrorType::File => {
            say!(Yellow "🏚 Can't find/read/write file or directory: ", location);
        }

        ErrorType::Config => {
            say!("\n (-_-)  🔥🔥🔥🔥 ", Dark Magenta location, " 🔥🔥🔥🔥  <(^~^)/ ");
            say!(Yellow "CONFIG FILE ISSUE- ");
            say!(Dark Yellow "Malformed config file, something doesn't make sense inside it");
        }

        ErrorType::Compiler => {
            if !location.is_empty() {
                say!("\nヽ༼☉ ‿ ⚆༽ﾉ  🔥🔥🔥🔥 ", Dark Magenta location, " 🔥🔥🔥🔥  ╰(° _ o╰) ");
            }
            say!(Yellow "COMPILER BUG - ");
            say!(Dark Yellow "generator developer skill issue (not your fault)");
        }
    }

    say!(Red e.msg);

    let mut details = e.metadata.iter().collect::<Vec<_>>();
    details.sort_by_key(|(key, _)| format!("{:?}", key));
    for (key, value) in details {
        say!(Bright Black format!("  {:?}: {}", key, value));
    }
}
