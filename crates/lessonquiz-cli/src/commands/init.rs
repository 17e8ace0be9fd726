//! The `lessonquiz init` command.

use std::path::Path;

use anyhow::Result;

const SAMPLE_CHAPTER_PATH: &str = "chapters/present-simple/05-final.json";

pub fn execute() -> Result<()> {
    // Create lessonquiz.toml
    if Path::new("lessonquiz.toml").exists() {
        println!("lessonquiz.toml already exists, skipping.");
    } else {
        std::fs::write("lessonquiz.toml", SAMPLE_CONFIG)?;
        println!("Created lessonquiz.toml");
    }

    // Create sample chapter
    std::fs::create_dir_all("chapters/present-simple")?;
    let chapter_path = Path::new(SAMPLE_CHAPTER_PATH);
    if chapter_path.exists() {
        println!("{SAMPLE_CHAPTER_PATH} already exists, skipping.");
    } else {
        std::fs::write(chapter_path, SAMPLE_CHAPTER)?;
        println!("Created {SAMPLE_CHAPTER_PATH}");
    }

    println!("\nNext steps:");
    println!("  1. Run: lessonquiz validate");
    println!("  2. Run: lessonquiz quiz present-simple");
    println!("  3. Run: lessonquiz play present-simple");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# lessonquiz configuration

content_dir = "./chapters"
chapter_file = "05-final.json"
results_path = "./lessonquiz-results/test_results.json"
multi_select_debounce_ms = 300
pass_percentage = 70
"#;

const SAMPLE_CHAPTER: &str = r#"{
  "id": "present-simple",
  "section_id": "tenses",
  "title": "Present Simple",
  "title_short": "Present Simple",
  "order": 1,
  "level": "A1",
  "estimated_minutes": 15,
  "description": "Habits, routines and facts.",
  "blocks": [
    {
      "type": "theory",
      "id": "t-affirmative",
      "title": "Affirmative sentences",
      "theory": {
        "content_md": "Add **-s** or **-es** to the verb after he, she and it.",
        "examples": [{ "text": "She works in a bank." }],
        "key_points": ["he/she/it + verb-s"],
        "common_mistakes": [{ "wrong": "He work here.", "right": "He works here." }]
      }
    },
    {
      "type": "theory",
      "id": "t-negative",
      "title": "Negative sentences",
      "theory": {
        "content_md": "Use **doesn't** after he, she and it, and **don't** otherwise.",
        "examples": [{ "text": "They don't eat meat." }],
        "key_points": ["he/she/it + doesn't + base verb"]
      }
    },
    {
      "type": "quiz_inline",
      "id": "check-1",
      "title": "Quick check",
      "theory_block_id": "t-affirmative",
      "quiz_inline": {
        "question_ids": ["ps-1", "ps-2"],
        "show_answers_immediately": true
      }
    }
  ],
  "question_bank": {
    "questions": [
      {
        "id": "ps-1",
        "type": "mcq_single",
        "prompt": "She ___ to work every day.",
        "theory_block_id": "t-affirmative",
        "choices": [
          { "id": "a", "text": "go" },
          { "id": "b", "text": "goes" },
          { "id": "c", "text": "going" }
        ],
        "correct_answer": "b",
        "explanation": "After she, the verb takes -s: goes."
      },
      {
        "id": "ps-2",
        "type": "fill_blank",
        "prompt": "He ___ (watch) TV in the evening.",
        "theory_block_id": "t-affirmative",
        "correct_answer": "watches",
        "explanation": "Verbs ending in -ch add -es."
      },
      {
        "id": "ps-3",
        "type": "reorder",
        "prompt": "Put the words in order.",
        "theory_block_id": "t-affirmative",
        "difficulty": 2,
        "correct_answer": "My brother plays football.",
        "explanation": "Subject, verb, object."
      },
      {
        "id": "ps-4",
        "type": "true_false",
        "prompt": "\"I doesn't like coffee.\" is correct.",
        "theory_block_id": "t-negative",
        "correct_answer": false,
        "explanation": "With I, use don't."
      },
      {
        "id": "ps-5",
        "type": "mcq_multi",
        "prompt": "Which sentences are correct?",
        "theory_block_id": "t-negative",
        "choices": [
          { "id": "a", "text": "She doesn't work." },
          { "id": "b", "text": "She don't work." },
          { "id": "c", "text": "They don't work." },
          { "id": "d", "text": "They doesn't work." }
        ],
        "correct_answer": ["a", "c"],
        "explanation": "doesn't goes with he/she/it, don't with the rest."
      },
      {
        "id": "ps-6",
        "type": "error_spotting",
        "prompt": "Find the mistake: She don't like tea.",
        "theory_block_id": "t-negative",
        "difficulty": 2,
        "choices": [
          { "id": "a", "text": "She" },
          { "id": "b", "text": "don't", "feedback": "She needs doesn't." },
          { "id": "c", "text": "like" },
          { "id": "d", "text": "tea" }
        ],
        "correct_answer": "b",
        "explanation": "She doesn't like tea."
      }
    ]
  },
  "chapter_test": {
    "num_questions": 5,
    "pool_question_ids": ["ps-1", "ps-2", "ps-3", "ps-4", "ps-5", "ps-6"],
    "selection_strategy": {
      "type": "stratified_by_theory_block",
      "min_per_theory_block": 1,
      "difficulty_mix": { "1": 0.6, "2": 0.4 }
    }
  }
}
"#;
