//! The twelve flows: for each tool, its Input Schema, Output Schema and
//! Prompt Template.

use serde_json::Value;

use super::errors::Result;
use super::models::{ToolRequest, ToolResponse};
use super::schema::{FieldKind, FieldSpec, ObjectSchema};
use super::template::{Block, PromptTemplate};
use super::types::{Priority, ReviewFocus, SchemaFormat, TestFramework, ToolName};

const JSON_REPLY: &str = "\nRespond in valid JSON format.\n";

#[derive(Debug)]
pub struct FlowSpec {
    pub tool: ToolName,
    pub title: &'static str,
    pub description: &'static str,
    pub input: ObjectSchema,
    pub output: ObjectSchema,
    pub template: PromptTemplate,
}

impl FlowSpec {
    pub fn validate(&self, candidate: &Value) -> Result<ToolRequest> {
        self.input.validate_input(self.tool, candidate)
    }

    pub fn render(&self, request: &ToolRequest) -> String {
        self.template.render(request)
    }

    pub fn check_output(&self, reply: &Value) -> Result<ToolResponse> {
        self.output.check_output(self.tool, reply)
    }

    pub fn input_json_schema(&self) -> Value {
        self.input.to_json_schema()
    }

    pub fn output_json_schema(&self) -> Value {
        self.output.to_json_schema()
    }
}

/// Catalog entry for `tool`.
pub fn flow(tool: ToolName) -> &'static FlowSpec {
    // FLOWS is declared in ToolName::ALL order.
    &FLOWS[tool as usize]
}

pub fn all_flows() -> &'static [FlowSpec] {
    &FLOWS
}

// ── field tables ──────────────────────────────────────────────────────────────

const PROMPT_VARIANT: &[FieldSpec] = &[
    FieldSpec::required(
        "title",
        FieldKind::Text,
        "A short title for the prompt variant (e.g., \"Chain-of-Thought Version\").",
    ),
    FieldSpec::required("prompt", FieldKind::Text, "The optimized prompt text."),
    FieldSpec::required("tips", FieldKind::Text, "Usage tips for this specific prompt variant."),
];

const GENERATED_FILE: &[FieldSpec] = &[
    FieldSpec::required("path", FieldKind::Text, "The full path of the file."),
    FieldSpec::required("content", FieldKind::Text, "The content of the file."),
];

const REVIEW_ISSUE: &[FieldSpec] = &[
    FieldSpec::required(
        "priority",
        FieldKind::OneOf(Priority::LITERALS),
        "The priority of the issue.",
    ),
    FieldSpec::required(
        "description",
        FieldKind::Text,
        "A detailed description of the issue found.",
    ),
    FieldSpec::required(
        "suggestion",
        FieldKind::Text,
        "The suggested code change to fix the issue.",
    ),
];

const API_EXAMPLE: &[FieldSpec] = &[
    FieldSpec::required(
        "language",
        FieldKind::Text,
        "The language of the example snippet (e.g., \"cURL\", \"JavaScript\").",
    ),
    FieldSpec::required("snippet", FieldKind::Text, "The example request code snippet."),
];

// ── catalog ───────────────────────────────────────────────────────────────────

static FLOWS: [FlowSpec; 12] = [
    FlowSpec {
        tool: ToolName::CommitMessageGenerator,
        title: "AI Commit Message Generator",
        description: "Summarize git diffs into clear, conventional commit messages.",
        input: ObjectSchema::new(&[FieldSpec::required(
            "diff",
            FieldKind::Text,
            "The git diff of the changes to be committed.",
        )]),
        output: ObjectSchema::new(&[FieldSpec::required(
            "commitMessage",
            FieldKind::Text,
            "The generated single-line commit message.",
        )]),
        template: PromptTemplate::new(&[
            Block::Text(concat!(
                "You are an expert at writing clear and concise Git commit messages. ",
                "Your task is to summarize the provided git diff into a single, clear commit message.\n",
                "\n",
                "**Git Diff:**\n",
                "```diff\n",
            )),
            Block::Field("diff"),
            Block::Text(concat!(
                "\n```\n",
                "\n",
                "Generate a single-line commit message that describes the changes.\n",
            )),
            Block::Text(JSON_REPLY),
        ]),
    },
    FlowSpec {
        tool: ToolName::ErrorLogExplainer,
        title: "Error Log Explainer & Fixer",
        description: "Translate cryptic stack traces into plain English and get step-by-step fixes.",
        input: ObjectSchema::new(&[
            FieldSpec::required("log", FieldKind::Text, "The full error log or stack trace."),
            FieldSpec::optional(
                "runtime",
                FieldKind::Text,
                "The runtime environment (e.g., \"Node.js\", \"Python\").",
            ),
        ]),
        output: ObjectSchema::new(&[
            FieldSpec::required(
                "explanation",
                FieldKind::Text,
                "A clear explanation of what the error means.",
            ),
            FieldSpec::required(
                "stepsToFix",
                FieldKind::TextList,
                "A step-by-step guide on how to fix the error.",
            ),
        ]),
        template: PromptTemplate::new(&[
            Block::Text(concat!(
                "You are an expert software diagnostician. Your task is to analyze the following error log, ",
                "explain what it means in simple terms, and provide a step-by-step guide to fix it.\n",
            )),
            Block::When(
                "runtime",
                &[
                    Block::Text("The runtime environment is **"),
                    Block::Field("runtime"),
                    Block::Text("**.\n"),
                ],
            ),
            Block::Text("\n**Error Log:**\n```\n"),
            Block::Field("log"),
            Block::Text(concat!(
                "\n```\n",
                "\n",
                "Provide a clear, concise explanation of the root cause of this error. ",
                "Then, provide a list of actionable steps to resolve the issue.\n",
            )),
            Block::Text(JSON_REPLY),
        ]),
    },
    FlowSpec {
        tool: ToolName::ReadmeGenerator,
        title: "README.md Generator",
        description: "Create professional README files from project details or a package.json.",
        input: ObjectSchema::new(&[
            FieldSpec::required("name", FieldKind::Text, "The name of the project."),
            FieldSpec::required(
                "purpose",
                FieldKind::Text,
                "A brief description of the project's purpose.",
            ),
            FieldSpec::optional("install", FieldKind::Text, "Installation instructions."),
            FieldSpec::optional("usage", FieldKind::Text, "Usage instructions or examples."),
            FieldSpec::optional(
                "packageJson",
                FieldKind::Text,
                "The content of the package.json file, if available.",
            ),
        ]),
        output: ObjectSchema::new(&[FieldSpec::required(
            "markdown",
            FieldKind::Text,
            "The generated README content in Markdown format.",
        )]),
        template: PromptTemplate::new(&[
            Block::Text(concat!(
                "You are an expert at creating high-quality README.md files for software projects. ",
                "Your task is to generate a comprehensive and well-structured README based on the provided project details.\n",
                "\n",
                "**Project Name:** ",
            )),
            Block::Field("name"),
            Block::Text("\n**Purpose:** "),
            Block::Field("purpose"),
            Block::Text("\n"),
            Block::When(
                "install",
                &[
                    Block::Text("**Installation:** "),
                    Block::Field("install"),
                    Block::Text("\n"),
                ],
            ),
            Block::When(
                "usage",
                &[
                    Block::Text("**Usage:** "),
                    Block::Field("usage"),
                    Block::Text("\n"),
                ],
            ),
            Block::When(
                "packageJson",
                &[
                    Block::Text("**package.json content:**\n```json\n"),
                    Block::Field("packageJson"),
                    Block::Text(concat!(
                        "\n```\n",
                        "Use the package.json to infer dependencies and scripts ",
                        "if installation/usage instructions are not provided.\n",
                    )),
                ],
            ),
            Block::Text(concat!(
                "\n",
                "Create a README.md in Markdown format. The file should be well-organized with clear headings ",
                "(e.g., ## Installation, ## Usage, ## Features). Include a project title, a brief introduction, ",
                "and any other relevant sections based on the input.\n",
            )),
            Block::Text(JSON_REPLY),
        ]),
    },
    FlowSpec {
        tool: ToolName::RegexGenerator,
        title: "Regex Generator & Tester",
        description: "Generate and test regular expressions from plain English descriptions.",
        input: ObjectSchema::new(&[FieldSpec::required(
            "description",
            FieldKind::Text,
            "A plain-English description of the pattern to match.",
        )]),
        output: ObjectSchema::new(&[
            FieldSpec::required(
                "regex",
                FieldKind::Text,
                "The generated regular expression pattern (without slashes).",
            ),
            FieldSpec::required(
                "explanation",
                FieldKind::Text,
                "A breakdown of how the regular expression works.",
            ),
        ]),
        template: PromptTemplate::new(&[
            Block::Text(concat!(
                "You are a regular expression expert. ",
                "Your task is to create a regex pattern based on a user's plain-English description.\n",
                "\n",
                "**Description**: \"",
            )),
            Block::Field("description"),
            Block::Text(concat!(
                "\"\n",
                "\n",
                "Generate the regex pattern. Do not include the leading and trailing slashes. ",
                "Also provide a step-by-step explanation of how the pattern works to match the described text.\n",
            )),
            Block::Text(JSON_REPLY),
        ]),
    },
    FlowSpec {
        tool: ToolName::PromptOptimizer,
        title: "Prompt Optimizer",
        description: "Refine and enhance your AI prompts to get better, more accurate results.",
        input: ObjectSchema::new(&[FieldSpec::required(
            "prompt",
            FieldKind::Text,
            "The user-provided rough prompt to be optimized.",
        )]),
        output: ObjectSchema::new(&[
            FieldSpec::required(
                "optimizedPrompt",
                FieldKind::Text,
                "The primary optimized version of the prompt.",
            ),
            FieldSpec::required(
                "variants",
                FieldKind::Records(PROMPT_VARIANT),
                "A list of alternative prompt variants with different strategies.",
            ),
        ]),
        template: PromptTemplate::new(&[
            Block::Text(concat!(
                "You are an expert in prompt engineering. Your task is to take a user's rough prompt ",
                "and rewrite it to be more effective for a large language model. ",
                "You should also provide several alternative variants using different prompting strategies.\n",
                "\n",
                "**User's Rough Prompt:**\n",
                "\"",
            )),
            Block::Field("prompt"),
            Block::Text(concat!(
                "\"\n",
                "\n",
                "First, create a primary, optimized version of the prompt that is clear, specific, and provides good context.\n",
                "\n",
                "Then, create at least two alternative variants. Examples of strategies include:\n",
                "- **Chain-of-Thought**: Instruct the model to think step-by-step.\n",
                "- **Role-Playing**: Assign a specific persona to the model (e.g., \"You are a world-class marketer...\").\n",
                "- **Zero-Shot CoT**: Add \"Let's think step by step\" to the end.\n",
                "- **Structured Output**: Request the output in a specific format like JSON or Markdown.\n",
                "\n",
                "For each variant, provide a title, the prompt text, and a brief tip on when to use it.\n",
            )),
            Block::Text(JSON_REPLY),
        ]),
    },
    FlowSpec {
        tool: ToolName::UnitTestGenerator,
        title: "Unit Test Generator",
        description: "Automatically generate unit tests for your functions using Jest or Vitest.",
        input: ObjectSchema::new(&[
            FieldSpec::required(
                "code",
                FieldKind::Text,
                "The function or small code file to write unit tests for.",
            ),
            FieldSpec::required(
                "framework",
                FieldKind::OneOf(TestFramework::LITERALS),
                "The testing framework to use.",
            ),
        ]),
        output: ObjectSchema::new(&[FieldSpec::required(
            "testCode",
            FieldKind::Text,
            "The generated unit test code.",
        )]),
        template: PromptTemplate::new(&[
            Block::Text(concat!(
                "You are an expert software engineer specializing in Test-Driven Development. ",
                "Your task is to write a comprehensive suite of unit tests for the provided code snippet using the **",
            )),
            Block::Field("framework"),
            Block::Text(concat!(
                "** framework.\n",
                "\n",
                "**Code to Test:**\n",
                "```\n",
            )),
            Block::Field("code"),
            Block::Text(concat!(
                "\n```\n",
                "\n",
                "Generate a complete test file. The tests should cover:\n",
                "- Happy path scenarios with valid inputs.\n",
                "- Edge cases and boundary conditions (e.g., null, undefined, empty values).\n",
                "- Error handling and how the code behaves with invalid inputs.\n",
                "- Mocks for any external dependencies or imports.\n",
                "\n",
                "Ensure the tests are clear, well-structured, and follow modern best practices for the chosen framework. ",
                "The generated code should be ready to run.\n",
            )),
            Block::Text(JSON_REPLY),
        ]),
    },
    FlowSpec {
        tool: ToolName::CodeFixer,
        title: "Error-to-Code Fix Snippets",
        description: "Get minimal, AI-generated code patches to fix specific errors.",
        input: ObjectSchema::new(&[
            FieldSpec::required("error", FieldKind::Text, "The error message or stack trace."),
            FieldSpec::required(
                "code",
                FieldKind::Text,
                "The code snippet that is causing the error.",
            ),
        ]),
        output: ObjectSchema::new(&[
            FieldSpec::required(
                "patch",
                FieldKind::Text,
                "The minimal patch or diff of the lines to change to fix the code. Use a standard diff format.",
            ),
            FieldSpec::required("explanation", FieldKind::Text, "A brief explanation of the fix."),
        ]),
        template: PromptTemplate::new(&[
            Block::Text(concat!(
                "You are an expert software developer who excels at debugging. ",
                "Your task is to analyze an error message and a related code snippet, ",
                "and then provide a minimal patch to fix the issue.\n",
                "\n",
                "**Error Message:**\n",
                "```\n",
            )),
            Block::Field("error"),
            Block::Text(concat!(
                "\n```\n",
                "\n",
                "**Code Snippet:**\n",
                "```\n",
            )),
            Block::Field("code"),
            Block::Text(concat!(
                "\n```\n",
                "\n",
                "Based on the error, provide a patch in a standard diff format that corrects the code. ",
                "Also, provide a brief explanation of what caused the error and how the patch fixes it. ",
                "The explanation should be concise and easy to understand for a developer.\n",
            )),
            Block::Text(JSON_REPLY),
        ]),
    },
    FlowSpec {
        tool: ToolName::SqlQueryBuilder,
        title: "SQL Query Builder",
        description: "Build complex SQL queries from natural language and a database schema.",
        input: ObjectSchema::new(&[
            FieldSpec::required(
                "query",
                FieldKind::Text,
                "The natural language description of the data to retrieve.",
            ),
            FieldSpec::required(
                "schema",
                FieldKind::Text,
                "The database schema (e.g., CREATE TABLE statements).",
            ),
        ]),
        output: ObjectSchema::new(&[
            FieldSpec::required("sqlQuery", FieldKind::Text, "The generated SQL query."),
            FieldSpec::required(
                "assumptions",
                FieldKind::Text,
                "An explanation of any assumptions made while translating the query.",
            ),
        ]),
        template: PromptTemplate::new(&[
            Block::Text(concat!(
                "You are an expert SQL developer. ",
                "Your task is to convert a natural language query into a SQL query, given a database schema.\n",
                "\n",
                "**Database Schema:**\n",
                "```sql\n",
            )),
            Block::Field("schema"),
            Block::Text(concat!(
                "\n```\n",
                "\n",
                "**Natural Language Query**: \"",
            )),
            Block::Field("query"),
            Block::Text(concat!(
                "\"\n",
                "\n",
                "Generate the corresponding SQL query. The query should be efficient and syntactically correct. ",
                "Also, briefly explain any assumptions you made ",
                "(e.g., about how tables join, or how to interpret ambiguous terms).\n",
            )),
            Block::Text(JSON_REPLY),
        ]),
    },
    FlowSpec {
        tool: ToolName::DocstringGenerator,
        title: "Docstring & Comment Generator",
        description: "Automatically add docstrings and inline comments to your code files.",
        input: ObjectSchema::new(&[
            FieldSpec::required(
                "code",
                FieldKind::Text,
                "The content of the code file to be documented.",
            ),
            FieldSpec::required(
                "language",
                FieldKind::Text,
                "The programming language of the code (e.g., \"python\", \"typescript\").",
            ),
        ]),
        output: ObjectSchema::new(&[FieldSpec::required(
            "annotatedCode",
            FieldKind::Text,
            "The original code with inserted docstrings and comments.",
        )]),
        template: PromptTemplate::new(&[
            Block::Text(concat!(
                "You are an expert technical writer who specializes in annotating code. ",
                "Your task is to add clear, concise docstrings and inline comments to the provided code file ",
                "to improve its readability and maintainability.\n",
                "\n",
                "The code is written in **",
            )),
            Block::Field("language"),
            Block::Text(concat!(
                "**.\n",
                "\n",
                "Analyze the code and insert documentation where appropriate. ",
                "For functions and classes, add docstrings that explain their purpose, parameters (including types), ",
                "and return values. Add inline comments to clarify complex or non-obvious logic.\n",
                "\n",
                "Return the complete file content with the new docstrings and comments inserted. ",
                "Do not change any of the existing code.\n",
                "\n",
                "**Code to Document:**\n",
                "```",
            )),
            Block::Field("language"),
            Block::Text("\n"),
            Block::Field("code"),
            Block::Text("\n```\n"),
            Block::Text(JSON_REPLY),
        ]),
    },
    FlowSpec {
        tool: ToolName::BoilerplateGenerator,
        title: "Boilerplate Project Generator",
        description: "Generate a downloadable starter project for various frameworks.",
        input: ObjectSchema::new(&[
            FieldSpec::required(
                "stack",
                FieldKind::Text,
                "The primary technology stack (e.g., \"Next.js with Tailwind CSS\").",
            ),
            FieldSpec::optional(
                "options",
                FieldKind::TextList,
                "Additional options like \"Include API route\", \"Add README.md\".",
            ),
        ]),
        output: ObjectSchema::new(&[FieldSpec::required(
            "files",
            FieldKind::Records(GENERATED_FILE),
            "A list of generated files with their paths and content.",
        )]),
        template: PromptTemplate::new(&[
            Block::Text(concat!(
                "You are an expert project scaffolding tool. ",
                "Your task is to generate a complete set of boilerplate files for a new software project ",
                "based on the user's requested stack and options.\n",
                "\n",
                "**Stack**: ",
            )),
            Block::Field("stack"),
            Block::Text("\n"),
            Block::When(
                "options",
                &[
                    Block::Text("**Options**:\n"),
                    Block::Each(
                        "options",
                        &[Block::Text("- "), Block::Item, Block::Text("\n")],
                    ),
                ],
            ),
            Block::Text(concat!(
                "\n",
                "Generate all the necessary files, including configuration files (e.g., package.json, tsconfig.json), ",
                "entry points (e.g., src/index.ts, src/app/page.tsx), and basic directory structures. ",
                "The generated code should be modern, follow best practices, ",
                "and be ready for a developer to start building on.\n",
                "\n",
                "Respond in valid JSON format with a list of file objects, each containing a 'path' and 'content'.\n",
            )),
        ]),
    },
    FlowSpec {
        tool: ToolName::CodeReviewer,
        title: "Lightweight Code Reviewer",
        description: "Get a targeted AI code review focused on security, performance, or readability.",
        input: ObjectSchema::new(&[
            FieldSpec::required("diff", FieldKind::Text, "The code diff or files to be reviewed."),
            FieldSpec::required(
                "focus",
                FieldKind::OneOf(ReviewFocus::LITERALS),
                "The area of focus for the review.",
            ),
        ]),
        output: ObjectSchema::new(&[FieldSpec::required(
            "issues",
            FieldKind::Records(REVIEW_ISSUE),
            "A prioritized list of issues and code suggestions.",
        )]),
        template: PromptTemplate::new(&[
            Block::Text(concat!(
                "You are an expert code review assistant. ",
                "Your task is to provide a targeted review of the provided code diff, focusing specifically on **",
            )),
            Block::Field("focus"),
            Block::Text(concat!(
                "**.\n",
                "\n",
                "Analyze the following code changes and identify relevant issues. ",
                "For each issue, provide a priority, a clear description, ",
                "and a specific code suggestion for how to fix it.\n",
                "\n",
                "**Code Diff to Review:**\n",
                "```diff\n",
            )),
            Block::Field("diff"),
            Block::Text(concat!(
                "\n```\n",
                "\n",
                "Focus your entire review on **",
            )),
            Block::Field("focus"),
            Block::Text("**.\n"),
            Block::Text(JSON_REPLY),
        ]),
    },
    FlowSpec {
        tool: ToolName::SchemaDocsGenerator,
        title: "Schema-to-Docs Generator",
        description: "Convert an OpenAPI or GraphQL schema into human-readable documentation.",
        input: ObjectSchema::new(&[
            FieldSpec::required(
                "schema",
                FieldKind::Text,
                "The OpenAPI or GraphQL schema content (JSON or YAML).",
            ),
            FieldSpec::required(
                "format",
                FieldKind::OneOf(SchemaFormat::LITERALS),
                "The format of the provided schema.",
            ),
        ]),
        output: ObjectSchema::new(&[
            FieldSpec::required(
                "documentation",
                FieldKind::Text,
                "The human-readable documentation in Markdown format.",
            ),
            FieldSpec::required(
                "examples",
                FieldKind::Records(API_EXAMPLE),
                "A list of example requests for the API.",
            ),
        ]),
        template: PromptTemplate::new(&[
            Block::Text(concat!(
                "You are an expert technical writer specializing in API documentation. ",
                "Your task is to convert a raw API schema into human-readable documentation with clear examples.\n",
                "\n",
                "**Schema Format:** ",
            )),
            Block::Field("format"),
            Block::Text(concat!(
                "\n",
                "\n",
                "**Schema Content:**\n",
                "```\n",
            )),
            Block::Field("schema"),
            Block::Text(concat!(
                "\n```\n",
                "\n",
                "Analyze the schema and generate the following:\n",
                "1.  **Human-Readable Documentation**: A clear, well-structured guide in Markdown ",
                "that explains the available endpoints, types, queries, or mutations.\n",
                "2.  **Example Requests**: Provide at least two practical example requests, ",
                "such as a 'cURL' command and a 'JavaScript' (fetch) snippet.\n",
            )),
            Block::Text(JSON_REPLY),
        ]),
    },
];
