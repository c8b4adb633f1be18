use crate::check::Check;
use crate::model::Attachment;
use crate::template::{RoundSpec, Template};

/// Fixed, ordered set of assignment templates. Ordering matters: the seeded
/// round-1 draw indexes into it.
#[derive(Clone, Debug)]
pub struct Catalog {
    templates: Vec<Template>,
}

impl Catalog {
    pub fn new(templates: Vec<Template>) -> Self {
        Self { templates }
    }

    pub fn get(&self, template_id: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.id == template_id)
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// The built-in assignment catalog: five small web applications, each
    /// with a round-1 build brief and a round-2 enhancement brief.
    pub fn builtin() -> Self {
        Self::new(vec![
            image_viewer(),
            calculator(),
            todo_list(),
            weather_dashboard(),
            quiz_app(),
        ])
    }
}

fn element(selector: &str) -> Check {
    Check::ElementExists {
        selector: selector.to_string(),
        min_count: 1,
    }
}

fn element_min(selector: &str, min_count: usize) -> Check {
    Check::ElementExists {
        selector: selector.to_string(),
        min_count,
    }
}

fn button(texts: &[&str]) -> Check {
    Check::ButtonExists {
        text: texts.iter().map(|s| s.to_string()).collect(),
    }
}

fn click(selector: &str, result: &str) -> Check {
    Check::ClickInteraction {
        selector: selector.to_string(),
        result: result.to_string(),
    }
}

fn responsive(breakpoints: &[u32]) -> Check {
    Check::ResponsiveCheck {
        breakpoints: breakpoints.to_vec(),
    }
}

fn image_viewer() -> Template {
    Template {
        id: "image-viewer".into(),
        name: "Image Viewer".into(),
        round1: RoundSpec::new(
            "Create a simple image viewer web application with the following features:\n\
             - Display {num_images} images in a grid layout\n\
             - Each image should be {size}px in size\n\
             - Clicking an image should show it in a modal/lightbox view\n\
             - Include next/previous buttons in the lightbox\n\
             - Use the provided image attachments\n\
             - Make it responsive and visually appealing\n\
             - Background color: {bg_color}",
        )
        .param("num_images", &["3", "4", "5", "6"])
        .param("size", &["150", "200", "250"])
        .param("bg_color", &["#f0f0f0", "#ffffff", "#e8e8e8", "#fafafa"])
        .attachment(Attachment::by_url(
            "image1.jpg",
            "image/jpeg",
            "https://picsum.photos/400/300?random=1",
        ))
        .attachment(Attachment::by_url(
            "image2.jpg",
            "image/jpeg",
            "https://picsum.photos/400/300?random=2",
        ))
        .attachment(Attachment::by_url(
            "image3.jpg",
            "image/jpeg",
            "https://picsum.photos/400/300?random=3",
        ))
        .attachment(Attachment::by_url(
            "image4.jpg",
            "image/jpeg",
            "https://picsum.photos/400/300?random=4",
        ))
        .check(element_min("img", 3))
        .check(element(".modal, .lightbox, [data-lightbox]"))
        .check(click("img", "modal_opens"))
        .check(element("button, .nav, .prev, .next"))
        .check(responsive(&[768, 1024])),
        round2: RoundSpec::new(
            "Enhance your image viewer with these additional features:\n\
             - Add support for SVG images\n\
             - Implement zoom in/out functionality (buttons or mouse wheel)\n\
             - Add pan/drag capability when zoomed in\n\
             - Include a thumbnail strip at the bottom\n\
             - Add keyboard navigation (arrow keys)\n\
             - Add {animation_type} transition animations\n\
             - Include an image counter (e.g., \"3 / 6\")",
        )
        .param("animation_type", &["fade", "slide", "zoom", "flip"])
        .attachment(Attachment::inline(
            "icon.svg",
            "image/svg+xml",
            "<svg><circle cx=\"50\" cy=\"50\" r=\"40\" fill=\"blue\"/></svg>",
        ))
        .check(element("svg, [src$=\".svg\"]"))
        .check(element_min("[class*=\"zoom\"], button[title*=\"zoom\"]", 2))
        .check(element(".thumbnails, [class*=\"thumb\"]"))
        .check(element(".counter, [class*=\"count\"]"))
        .check(click(".thumbnails img, [class*=\"thumb\"] img", "image_changes"))
        .check(responsive(&[480, 768, 1024])),
    }
}

fn calculator() -> Template {
    Template {
        id: "calculator".into(),
        name: "Calculator".into(),
        round1: RoundSpec::new(
            "Create a calculator web application with:\n\
             - Basic operations: addition, subtraction, multiplication, division\n\
             - Display showing {display_digits} digits\n\
             - Number buttons (0-9) and operation buttons\n\
             - Clear (C) and equals (=) buttons\n\
             - {layout} button layout\n\
             - Error handling for division by zero\n\
             - Visual feedback on button clicks",
        )
        .param("display_digits", &["8", "10", "12"])
        .param("layout", &["grid", "vertical", "compact"])
        .check(element_min("button", 15))
        .check(element("input[type=\"text\"], .display, #display"))
        .check(button(&["C", "Clear", "AC"]))
        .check(button(&["="]))
        .check(responsive(&[768, 1024])),
        round2: RoundSpec::new(
            "Add advanced features to your calculator:\n\
             - Scientific functions: sin, cos, tan, sqrt, power\n\
             - Memory functions (M+, M-, MR, MC)\n\
             - Calculation history showing last {history_count} calculations\n\
             - Keyboard input support\n\
             - {feature} mode toggle\n\
             - Percentage calculation\n\
             - Parentheses support for complex expressions",
        )
        .param("history_count", &["5", "10", "15"])
        .param("feature", &["dark", "scientific", "programmer"])
        .check(element_min("button", 25))
        .check(button(&["sin", "cos", "tan", "sqrt"]))
        .check(button(&["M+", "M-", "MR", "MC"]))
        .check(element(".history, [class*=\"history\"]"))
        .check(button(&["%"]))
        .check(click("button", "display_updates")),
    }
}

fn todo_list() -> Template {
    Template {
        id: "todo-list".into(),
        name: "Todo List".into(),
        round1: RoundSpec::new(
            "Create a todo list application with:\n\
             - Input field to add new tasks\n\
             - List displaying all tasks\n\
             - Checkbox to mark tasks as complete\n\
             - Delete button for each task\n\
             - Show {counter_type} counter\n\
             - {storage} storage to persist tasks\n\
             - Completed tasks should have {completed_style}\n\
             - Add button with visual feedback",
        )
        .param("counter_type", &["total", "remaining", "completed"])
        .param("storage", &["localStorage", "sessionStorage"])
        .param(
            "completed_style",
            &["strikethrough", "gray color", "different opacity"],
        )
        .check(element("input[type=\"text\"], input[type=\"search\"]"))
        .check(element("button, [type=\"submit\"]"))
        .check(element("ul, ol, .todo-list"))
        .check(button(&["Add", "+"]))
        .check(element(".counter, [class*=\"count\"]"))
        .check(responsive(&[768, 1024])),
        round2: RoundSpec::new(
            "Enhance your todo list with:\n\
             - Categories or tags for tasks (minimum {num_categories} categories)\n\
             - Filter buttons (All, Active, Completed)\n\
             - Edit functionality for existing tasks\n\
             - Due date picker for tasks\n\
             - Priority levels (High, Medium, Low) with color coding\n\
             - Search/filter functionality\n\
             - Export to JSON functionality",
        )
        .param("num_categories", &["3", "4", "5"])
        .check(element("select, [class*=\"category\"], [class*=\"tag\"]"))
        .check(button(&["All", "Active", "Completed"]))
        .check(element("button[class*=\"edit\"], .edit-btn"))
        .check(element("input[type=\"date\"], .date-picker"))
        .check(element("[class*=\"priority\"], .high, .medium, .low"))
        .check(click("button", "list_updates"))
        .check(responsive(&[480, 768])),
    }
}

fn weather_dashboard() -> Template {
    Template {
        id: "weather-dashboard".into(),
        name: "Weather Dashboard".into(),
        round1: RoundSpec::new(
            "Create a weather dashboard with:\n\
             - Display current weather for {default_city}\n\
             - Show temperature in {temp_unit}\n\
             - Display weather condition icon/emoji\n\
             - Show humidity and wind speed\n\
             - {num_days}-day forecast\n\
             - Search box to change location\n\
             - Responsive card-based layout\n\
             - Use mock/sample data (no API required for now)",
        )
        .param("default_city", &["London", "New York", "Tokyo", "Paris"])
        .param("temp_unit", &["Celsius", "Fahrenheit"])
        .param("num_days", &["3", "5", "7"])
        .check(element(".temperature, [class*=\"temp\"]"))
        .check(element(".humidity, [class*=\"humidity\"]"))
        .check(element(".wind, [class*=\"wind\"]"))
        .check(element("img, .icon, .emoji"))
        .check(element(".forecast, [class*=\"forecast\"]"))
        .check(element("input[type=\"text\"], input[type=\"search\"]"))
        .check(responsive(&[768, 1024])),
        round2: RoundSpec::new(
            "Add these features to your weather dashboard:\n\
             - Hourly forecast (next {hourly_count} hours)\n\
             - Temperature chart/graph visualization\n\
             - Unit toggle (Celsius <-> Fahrenheit)\n\
             - Save favorite locations (up to {fav_count} cities)\n\
             - Display sunrise and sunset times\n\
             - UV index indicator\n\
             - \"Feels like\" temperature\n\
             - Weather alerts section",
        )
        .param("hourly_count", &["12", "24"])
        .param("fav_count", &["3", "5"])
        .check(element(".hourly, [class*=\"hourly\"]"))
        .check(element("canvas, svg, .chart"))
        .check(button(&["\u{b0}C", "\u{b0}F", "Toggle"]))
        .check(element(".favorites, [class*=\"favorite\"]"))
        .check(element(".sunrise, .sunset, [class*=\"sun\"]"))
        .check(element(".uv, [class*=\"uv-index\"]"))
        .check(click(".favorites button, [class*=\"favorite\"] button", "list_updates")),
    }
}

fn quiz_app() -> Template {
    Template {
        id: "quiz-app".into(),
        name: "Quiz Application".into(),
        round1: RoundSpec::new(
            "Create a quiz application with:\n\
             - {num_questions} multiple choice questions\n\
             - {choices_per_question} choices per question\n\
             - \"Next\" button to proceed through questions\n\
             - Display question number (e.g., \"Question 3 of 10\")\n\
             - Show final score at the end\n\
             - \"Restart Quiz\" button\n\
             - Visual feedback for selected answer\n\
             - {theme} color theme\n\
             - Questions provided in attachments",
        )
        .param("num_questions", &["5", "10"])
        .param("choices_per_question", &["4"])
        .param("theme", &["blue", "green", "purple", "orange"])
        .attachment(Attachment::inline(
            "questions.json",
            "application/json",
            r#"[
    {"question": "What is 2+2?", "choices": ["3", "4", "5", "6"], "correct": 1},
    {"question": "Capital of France?", "choices": ["London", "Berlin", "Paris", "Rome"], "correct": 2}
]"#,
        ))
        .check(element(".question, [class*=\"question\"]"))
        .check(element_min("input[type=\"radio\"], button[class*=\"choice\"]", 4))
        .check(button(&["Next", "Continue"]))
        .check(element(".progress, [class*=\"question-num\"]"))
        .check(button(&["Restart", "Try Again"]))
        .check(click("input[type=\"radio\"], button[class*=\"choice\"]", "selection_feedback")),
        round2: RoundSpec::new(
            "Enhance your quiz app with:\n\
             - Timer for each question ({time_limit} seconds)\n\
             - Progress bar showing completion percentage\n\
             - Score breakdown (correct/incorrect/skipped)\n\
             - Review mode showing all answers after completion\n\
             - Highlight correct/wrong answers with {correct_color} and {wrong_color}\n\
             - Category selection (minimum {num_categories} categories)\n\
             - Leaderboard with top {leaderboard_size} scores (localStorage)\n\
             - Difficulty levels (Easy, Medium, Hard)",
        )
        .param("time_limit", &["30", "45", "60"])
        .param("correct_color", &["green", "lightgreen", "#00ff00"])
        .param("wrong_color", &["red", "lightcoral", "#ff0000"])
        .param("num_categories", &["3", "4"])
        .param("leaderboard_size", &["5", "10"])
        .check(element(".timer, [class*=\"timer\"]"))
        .check(element("progress, .progress-bar"))
        .check(element(".score-breakdown, .statistics"))
        .check(button(&["Easy", "Medium", "Hard"]))
        .check(element(".leaderboard, [class*=\"leader\"]"))
        .check(click("button", "quiz_advances")),
    }
}
