use thiserror::Error;

/// Instructional preamble sent ahead of every user request.
///
/// Teaches the model the WAN 2.2 advanced formula and asks for 3-5 numbered
/// plain-text variations of the input.
pub const SYSTEM_PROMPT: &str = "You are an expert cinematographer and prompt engineer specializing in WAN 2.2 video generation. Your job is to transform basic user inputs into professional, cinematic prompts that follow the WAN 2.2 aesthetic control system.

Core Guidelines:
- Use the Advanced Formula: Subject + Scene + Motion + Aesthetic Control + Stylization
- Always include specific technical terms from the WAN 2.2 guide
- Focus on cinematic storytelling with professional visual language
- Include lighting, camera angles, composition, and color grading
- Add motion descriptions and stylistic elements

Required Elements to Include:
1. Aesthetic Control: Light source, lighting type, time of day, shot size, composition, lens, color tone
2. Camera Movement: Basic or advanced camera movements when appropriate
3. Stylization: Visual style and/or visual effects
4. Motion Description: Specific, fluid motion details
5. Technical Specifications: Use exact terminology from the guide

Format Instructions:
- Use clean text without markdown formatting
- Include specific lighting setup and camera specifications
- Use professional cinematography vocabulary
- Make prompts vivid and detailed but not overly long
- Ensure prompts are optimized for video generation quality

Example Transformation:
Input: \"a felt gnome village in the woods\"
Output: \"Felt style, golden hour sunlight, soft lighting, medium wide-angle, low-angle perspective, warm color palette. A whimsical village is nestled at the base of a giant, hollow tree trunk, surrounded by lush greenery and mushrooms. Little felt gnomes in woolen hats drive a miniature wooden train on moss-covered tracks. The train, pulled by a tiny engine, transports acorns and berries in small carts. Sunlight filters through the leaves above, casting soft shadows and highlighting the rich textures of the bark and foliage.\"

Generate 3-5 enhanced prompt variations for each user input, each with different cinematic approaches but maintaining the core concept. Use diverse lighting, camera angles, and stylistic choices across variations. Format output as clean text without bold, italics, or other markdown formatting.";

const USER_REQUEST_LABEL: &str = "User Request:";

const VARIATION_AXES: &[&str] = &[
    "Lighting setups (sunny, overcast, artificial, etc.)",
    "Camera angles and shot sizes",
    "Color palettes and moods",
    "Stylistic approaches",
    "Motion descriptions",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromptError {
    #[error("prompt is empty; please provide a description to enhance")]
    EmptyInput,
}

/// Compose the full payload for one enhancement request.
///
/// # Errors
///
/// Returns [`PromptError::EmptyInput`] when `raw_input` is empty or whitespace
/// only.
pub fn build_payload(raw_input: &str) -> Result<String, PromptError> {
    let request = user_request(raw_input)?;
    Ok(format!("{SYSTEM_PROMPT}\n\n{USER_REQUEST_LABEL} {request}"))
}

/// The wrapper sentence embedding the trimmed input, without the preamble.
pub fn user_request(raw_input: &str) -> Result<String, PromptError> {
    let subject = raw_input.trim();
    if subject.is_empty() {
        return Err(PromptError::EmptyInput);
    }

    let mut request = format!(
        "Transform this basic prompt into 3-5 professional WAN 2.2 video generation prompts with different cinematic approaches:\n\n\"{subject}\"\n\nEach variation should have different:\n"
    );
    for axis in VARIATION_AXES {
        request.push_str("- ");
        request.push_str(axis);
        request.push('\n');
    }
    request.push_str(
        "\nNumber each variation (1-5) and ensure they're all visually distinct while maintaining the core concept.",
    );

    Ok(request)
}
