//! Screen texts.

use crate::condition::BlockType;

pub const WELCOME: &str = "Thank you for participating in this study!\n\n\
Please read the instructions carefully.\n\n\n\
Press SPACE to see the instructions.";

const VIEWING_INTRO: &str = "During each trial you will be shown different visual illusions. \
Maintain fixation on the central fixation cross while viewing the illusions.";

pub const SETUP_NOTICE: &str = "Please wait. The experimenter will get the next block ready.";
pub const START_OF_BLOCK: &str = "starting block...";
pub const PRACTICE_COMPLETE: &str = "Test trials completed!\n\nPress SPACE to start the experiment.";
pub const END_OF_BLOCK: &str = "This block has ended.\n\nTake a break, you're doing great!";
pub const END_OF_EXPERIMENT: &str = "Thank you for your time, the experiment is complete!";
pub const BUTTON_LABEL: &str = "Ok, got it!";

/// Instructions shown above the demo while it plays.
pub fn demo_viewing(block: BlockType) -> String {
    let rest = match block {
        BlockType::CentreFillReaction => {
            "After a few seconds of viewing the illusion, the centre of the screen is going to \
             change. Maintain fixation during this change.\n\n\
             LEFT CLICK the mouse when all the dots on the screen look the same:"
        }
        BlockType::CentreFillReproduction => {
            "After a few seconds of viewing the illusion, the centre of the screen is going to \
             change. Maintain fixation on the cross during this change.\n\nExample:"
        }
        BlockType::BlackOut => {
            "After a few seconds of viewing the illusion, the centre of the screen is going to \
             black out. Maintain fixation on the cross during this change.\n\nExample:"
        }
    };
    format!("{VIEWING_INTRO}\n\n{rest}")
}

/// Instructions shown while the participant tries out the scroll adjustment.
pub fn demo_adjusting(block: BlockType) -> &'static str {
    match block {
        BlockType::BlackOut => {
            "A few seconds after the centre blacks out, a new screen will appear.\n\n\
             Try to re-create the stimuli you saw in the periphery AFTER the centre went \
             blank.\n\n\
             SCROLL the mouse to change the features of the stimuli. Try this out now!"
        }
        BlockType::CentreFillReaction | BlockType::CentreFillReproduction => {
            "A few seconds after the centre changes, a new screen will appear.\n\n\
             Try to re-create the stimuli you saw in the periphery AFTER the centre \
             changed.\n\n\
             SCROLL the mouse to change the features of the stimuli. Try this out now!"
        }
    }
}

/// Greedy word wrap to `max_cols` characters. Blank lines are kept; a word longer than a
/// line is split.
pub fn wrap(text: &str, max_cols: usize) -> Vec<String> {
    let max_cols = max_cols.max(1);
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let mut word = word;
            loop {
                let needed = if line.is_empty() {
                    word.chars().count()
                } else {
                    line.chars().count() + 1 + word.chars().count()
                };
                if needed <= max_cols {
                    if !line.is_empty() {
                        line.push(' ');
                    }
                    line.push_str(word);
                    break;
                }
                if !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                    continue;
                }
                let split = word
                    .char_indices()
                    .nth(max_cols)
                    .map_or(word.len(), |(i, _)| i);
                lines.push(word[..split].to_owned());
                word = &word[split..];
                if word.is_empty() {
                    break;
                }
            }
        }
        lines.push(line);
    }
    lines
}
