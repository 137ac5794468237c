use std::io::{self, Read};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use client::config::DEFAULT_API_BASE_URL;
use client::net::api::{self, ApiRequest, Method};
use client::net::error::{ApiError, classify_failure};
use client::net::types::{
    Comment, Credentials, DashboardStats, LoginResponse, NewComment, Post, PostDraft, PostPage,
    PostQuery,
};
use client::state::session::SessionManager;
use client::util::auth::should_end_session_at;
use client::util::markdown;
use client::util::token::{TokenReport, now_secs};
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod session_file;

use session_file::{FileStore, TerminalNavigator};

type CliSession = SessionManager<FileStore, TerminalNavigator>;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("not logged in; run `blog-cli login` first")]
    NotLoggedIn,
    #[error("session expired; run `blog-cli login` again")]
    SessionExpired,
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("could not read input: {0}")]
    Input(#[from] io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "blog-cli", about = "Blog API client with persistent login")]
struct Cli {
    #[arg(long, env = "BLOG_BASE_URL", default_value = DEFAULT_API_BASE_URL)]
    base_url: String,

    #[arg(long, env = "BLOG_SESSION_FILE", default_value = ".blog-session.json")]
    session_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone)]
struct CliContext {
    base_url: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and persist the session.
    Login(CredentialArgs),
    /// Create an account.
    Register(CredentialArgs),
    /// Drop the persisted session.
    Logout,
    /// Show the signed-in user and whether the token is still valid.
    Whoami,
    /// Print a diagnosis of the stored token.
    Token,
    /// Render markdown from a file or stdin to HTML.
    Render(RenderArgs),
    Posts(PostsCommand),
    Comments(CommentsCommand),
    Categories,
    Stats,
}

#[derive(Args, Debug)]
struct CredentialArgs {
    #[arg(long)]
    username: String,

    #[arg(long, env = "BLOG_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[arg(long, default_value = "-", help = "Input file path, or - for stdin")]
    input: String,

    #[arg(long, default_value_t = false, help = "Render a post-card excerpt instead")]
    excerpt: bool,
}

#[derive(Args, Debug)]
struct PostsCommand {
    #[command(subcommand)]
    command: PostsSubcommand,
}

#[derive(Subcommand, Debug)]
enum PostsSubcommand {
    List {
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        per_page: Option<u32>,
    },
    Read {
        id: i64,
        #[arg(long, default_value_t = false, help = "Print content rendered to HTML")]
        html: bool,
    },
    Create(DraftArgs),
    Update {
        id: i64,
        #[command(flatten)]
        draft: DraftArgs,
    },
    Delete {
        id: i64,
    },
}

#[derive(Args, Debug)]
struct DraftArgs {
    #[arg(long)]
    title: Option<String>,
    #[arg(long, help = "Markdown content file, or - for stdin")]
    content: Option<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long, help = "Comma-separated tags")]
    tags: Option<String>,
    #[arg(long)]
    status: Option<String>,
}

#[derive(Args, Debug)]
struct CommentsCommand {
    #[command(subcommand)]
    command: CommentsSubcommand,
}

#[derive(Subcommand, Debug)]
enum CommentsSubcommand {
    List {
        post_id: i64,
    },
    Add {
        post_id: i64,
        #[arg(long)]
        content: String,
        #[arg(long)]
        parent_id: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let ctx = CliContext {
        base_url: cli.base_url,
    };
    let mut session = SessionManager::new(FileStore::new(cli.session_file), TerminalNavigator);
    session.restore();

    match cli.command {
        Command::Login(args) => run_login(&ctx, &mut session, args).await,
        Command::Register(args) => run_register(&ctx, &mut session, args).await,
        Command::Logout => {
            session.logout();
            println!("logged out");
            Ok(())
        }
        Command::Whoami => run_whoami(&session),
        Command::Token => run_token(&session),
        Command::Render(args) => run_render(&args),
        Command::Posts(posts) => run_posts(&ctx, &mut session, posts).await,
        Command::Comments(comments) => run_comments(&ctx, &mut session, comments).await,
        Command::Categories => {
            let categories: Vec<String> =
                api_request(&ctx, &mut session, ApiRequest::list_categories()).await?;
            for category in categories {
                println!("{category}");
            }
            Ok(())
        }
        Command::Stats => {
            ensure_valid(&mut session)?;
            let stats: DashboardStats =
                api_request(&ctx, &mut session, ApiRequest::dashboard_stats()).await?;
            print_json(&serde_json::to_value(stats)?)
        }
    }
}

async fn run_login(ctx: &CliContext, session: &mut CliSession, args: CredentialArgs) -> Result<(), CliError> {
    let credentials = Credentials {
        username: args.username,
        password: args.password,
    };
    let response: LoginResponse = api_request(ctx, session, ApiRequest::login(&credentials)).await?;
    let username = response.user.username.clone();
    session.login(response.user, response.access_token);
    println!("logged in as {username}");
    Ok(())
}

async fn run_register(ctx: &CliContext, session: &mut CliSession, args: CredentialArgs) -> Result<(), CliError> {
    let credentials = Credentials {
        username: args.username,
        password: args.password,
    };
    let reply: Value = api_request(ctx, session, ApiRequest::register(&credentials)).await?;
    let message = reply
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("registered");
    println!("{message}");
    Ok(())
}

fn run_whoami(session: &CliSession) -> Result<(), CliError> {
    let user = session.user().ok_or(CliError::NotLoggedIn)?;
    let state = if session.is_valid() { "active" } else { "expired" };
    let role = if user.is_admin() { "admin" } else { "user" };
    println!("{} ({role}, session {state})", user.username);
    Ok(())
}

fn run_token(session: &CliSession) -> Result<(), CliError> {
    let token = session.token().ok_or(CliError::NotLoggedIn)?;
    print!("{}", TokenReport::inspect(token, now_secs()));
    if let Some(user) = session.user() {
        println!("user: {}", serde_json::to_string(user)?);
    }
    Ok(())
}

fn run_render(args: &RenderArgs) -> Result<(), CliError> {
    let text = read_input(&args.input)?;
    let html = if args.excerpt {
        markdown::render_excerpt(&text)
    } else {
        markdown::render(&text)
    };
    println!("{html}");
    Ok(())
}

async fn run_posts(ctx: &CliContext, session: &mut CliSession, posts: PostsCommand) -> Result<(), CliError> {
    match posts.command {
        PostsSubcommand::List {
            status,
            category,
            search,
            page,
            per_page,
        } => {
            let query = PostQuery {
                status,
                category,
                search,
                page,
                per_page,
            };
            let page: PostPage = api_request(ctx, session, ApiRequest::list_posts(&query)).await?;
            for post in &page.posts {
                println!(
                    "{:>5}  {}  [{}]  {}",
                    post.id,
                    post.title,
                    post.status.as_deref().unwrap_or("published"),
                    post.author.as_deref().unwrap_or("Unknown"),
                );
            }
            println!("page {} of {} ({} posts)", page.current_page, page.pages, page.total);
            Ok(())
        }
        PostsSubcommand::Read { id, html } => {
            let post: Post = api_request(ctx, session, ApiRequest::get_post(id)).await?;
            if html {
                println!("{}", markdown::render(&post.content));
                Ok(())
            } else {
                print_json(&serde_json::to_value(post)?)
            }
        }
        PostsSubcommand::Create(args) => {
            ensure_valid(session)?;
            let draft = draft_from(args)?;
            let post: Post = api_request(ctx, session, ApiRequest::create_post(&draft)).await?;
            println!("created post {}", post.id);
            Ok(())
        }
        PostsSubcommand::Update { id, draft } => {
            ensure_valid(session)?;
            let draft = draft_from(draft)?;
            let post: Post = api_request(ctx, session, ApiRequest::update_post(id, &draft)).await?;
            println!("updated post {}", post.id);
            Ok(())
        }
        PostsSubcommand::Delete { id } => {
            ensure_valid(session)?;
            let reply: Value = api_request(ctx, session, ApiRequest::delete_post(id)).await?;
            print_json(&reply)
        }
    }
}

async fn run_comments(
    ctx: &CliContext,
    session: &mut CliSession,
    comments: CommentsCommand,
) -> Result<(), CliError> {
    match comments.command {
        CommentsSubcommand::List { post_id } => {
            let comments: Vec<Comment> =
                api_request(ctx, session, ApiRequest::list_comments(post_id)).await?;
            for comment in &comments {
                print_comment(comment, 0);
            }
            Ok(())
        }
        CommentsSubcommand::Add {
            post_id,
            content,
            parent_id,
        } => {
            ensure_valid(session)?;
            let body = NewComment { content, parent_id };
            let comment: Comment =
                api_request(ctx, session, ApiRequest::add_comment(post_id, &body)).await?;
            println!("added comment {}", comment.id);
            Ok(())
        }
    }
}

fn print_comment(comment: &Comment, depth: usize) {
    let indent = "  ".repeat(depth);
    println!(
        "{indent}#{} {}: {}",
        comment.id,
        comment.author.as_deref().unwrap_or("Unknown"),
        comment.content
    );
    for reply in &comment.replies {
        print_comment(reply, depth + 1);
    }
}

fn draft_from(args: DraftArgs) -> Result<PostDraft, CliError> {
    let content = args.content.as_deref().map(read_input).transpose()?;
    Ok(PostDraft {
        title: args.title,
        content,
        category: args.category,
        tags: args.tags,
        status: args.status,
    })
}

/// Refuse mutating commands up front when the stored token has lapsed.
fn ensure_valid(session: &mut CliSession) -> Result<(), CliError> {
    if session.user().is_none() {
        return Err(CliError::NotLoggedIn);
    }
    if should_end_session_at(session, now_secs()) {
        session.end_session(client::config::SESSION_EXPIRED_NOTICE);
        return Err(CliError::SessionExpired);
    }
    Ok(())
}

async fn api_request<T: DeserializeOwned>(
    cli: &CliContext,
    session: &mut CliSession,
    request: ApiRequest,
) -> Result<T, CliError> {
    let method = match request.method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    };
    let url = request.url(&cli.base_url);
    tracing::debug!(%method, %url, "api request");

    let client = reqwest::Client::new();
    let mut builder = client.request(method, &url);
    if !request.query.is_empty() {
        builder = builder.query(&request.query);
    }
    if let Some(header) = session.authorization_header() {
        builder = builder.header(AUTHORIZATION, header);
    }
    if let Some(body) = &request.body {
        builder = builder.json(body);
    }

    let response = builder.send().await?;
    let status = response.status();
    let raw = response.text().await?;

    if !status.is_success() {
        let error = classify_failure(status.as_u16(), &raw, request.fallback);
        api::react_to_failure(session, &error);
        return Err(error.into());
    }

    serde_json::from_str(&raw).map_err(|e| ApiError::Decode(e.to_string()).into())
}

fn read_input(input: &str) -> Result<String, CliError> {
    if input == "-" {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        Ok(text)
    } else {
        Ok(std::fs::read_to_string(input)?)
    }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
